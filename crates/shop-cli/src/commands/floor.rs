//! Floor board and order cost views.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use shop_core::OrderId;
use shop_db::Database;

use super::util::signed;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Order ID.
    pub order_id: String,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Prints every workstation with its occupancy.
pub fn list_resources<W: Write>(writer: &mut W, db: &Database, args: &ListArgs) -> Result<()> {
    let resources = db.list_resources()?;
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&resources)?)?;
        return Ok(());
    }

    if resources.is_empty() {
        writeln!(writer, "No resources registered.")?;
        writeln!(writer)?;
        writeln!(writer, "Hint: Run 'shop resource add <id>' to register a workstation.")?;
        return Ok(());
    }

    writeln!(writer, "{:<12}  {:<11}  {:<16}  Task", "ID", "Status", "Name")?;
    for resource in resources {
        let line = format!(
            "{:<12}  {:<11}  {:<16}  {}",
            resource.id.as_str(),
            resource.occupancy_status.as_str(),
            resource.name.as_deref().unwrap_or("-"),
            resource
                .current_task_id
                .as_ref()
                .map_or("-", |task_id| task_id.as_str())
        );
        writeln!(writer, "{}", line.trim_end())?;
    }
    Ok(())
}

/// Prints an order's estimated against actual cost.
pub fn order_summary<W: Write>(writer: &mut W, db: &Database, args: &SummaryArgs) -> Result<()> {
    let summary = db.order_cost_summary(&OrderId::new(args.order_id.as_str())?)?;
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
        return Ok(());
    }

    match &summary.name {
        Some(name) => writeln!(writer, "Order {} ({name})", summary.order_id)?,
        None => writeln!(writer, "Order {}", summary.order_id)?,
    }
    writeln!(writer, "Estimated: {:.2}", summary.estimated_cost_total)?;
    writeln!(writer, "Actual:    {:.2}", summary.actual_cost_total)?;
    writeln!(writer, "Variance:  {}", signed(summary.cost_variance))?;
    let tasks = summary.tasks;
    writeln!(
        writer,
        "Tasks:     {} planned, {} in progress, {} paused, {} completed, {} cancelled",
        tasks.planned, tasks.in_progress, tasks.paused, tasks.completed, tasks.cancelled
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use shop_core::{ResourceId, ServiceDefinition, ServiceId, Timestamp, WorkerId};
    use shop_db::StartRequest;

    fn floor() -> (Database, shop_core::TaskId) {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_order(&OrderId::new("WO-3").unwrap(), Some("Gate hinges"))
            .unwrap();
        db.upsert_service(&ServiceDefinition {
            id: ServiceId::new("mill").unwrap(),
            name: "Milling".to_string(),
            default_quantity: 4.0,
            default_hours: 2.0,
            default_unit_price: 90.0,
        })
        .unwrap();
        db.upsert_resource(&ResourceId::new("mill-1").unwrap(), Some("Haas VF-2"))
            .unwrap();
        db.upsert_resource(&ResourceId::new("mill-2").unwrap(), None)
            .unwrap();
        db.set_maintenance(&ResourceId::new("mill-2").unwrap(), true)
            .unwrap();

        let task_id = db
            .start_task_at(
                &StartRequest {
                    order_id: OrderId::new("WO-3").unwrap(),
                    resource_id: ResourceId::new("mill-1").unwrap(),
                    service_id: ServiceId::new("mill").unwrap(),
                    worker_id: WorkerId::new("ana").unwrap(),
                },
                Timestamp::from_epoch_seconds(0),
            )
            .unwrap()
            .task
            .id;
        (db, task_id)
    }

    #[test]
    fn board_shows_occupancy() {
        let (db, task_id) = floor();
        let mut output = Vec::new();
        list_resources(&mut output, &db, &ListArgs { json: false }).unwrap();

        let output = String::from_utf8(output)
            .unwrap()
            .replace(task_id.as_str(), "[task]");
        assert_snapshot!(output, @r"
        ID            Status       Name              Task
        mill-1        active       Haas VF-2         [task]
        mill-2        maintenance  -                 -
        ");
    }

    #[test]
    fn empty_board_hints_at_registration() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        list_resources(&mut output, &db, &ListArgs { json: false }).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        No resources registered.

        Hint: Run 'shop resource add <id>' to register a workstation.
        ");
    }

    #[test]
    fn summary_after_one_completed_task() {
        let (mut db, task_id) = floor();
        db.stop_task_at(
            &task_id,
            &WorkerId::new("ana").unwrap(),
            Timestamp::from_epoch_seconds(9000),
        )
        .unwrap();

        let mut output = Vec::new();
        let args = SummaryArgs {
            order_id: "WO-3".to_string(),
            json: false,
        };
        order_summary(&mut output, &db, &args).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Order WO-3 (Gate hinges)
        Estimated: 360.00
        Actual:    225.00
        Variance:  -135.00
        Tasks:     0 planned, 0 in progress, 0 paused, 1 completed, 0 cancelled
        ");
    }

    #[test]
    fn summary_json_for_scripts() {
        let (db, _) = floor();
        let mut output = Vec::new();
        let args = SummaryArgs {
            order_id: "WO-3".to_string(),
            json: true,
        };
        order_summary(&mut output, &db, &args).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["order_id"], "WO-3");
        assert_eq!(json["tasks"]["in_progress"], 1);
        assert_eq!(json["actual_cost_total"], 0.0);
    }
}
