//! Task inspection: live timer, event log and a worker's active session.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use shop_core::{EventType, TaskId, Timestamp, WorkerId};
use shop_db::Database;

use super::util::{format_duration, signed};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Task ID.
    pub task_id: String,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Task ID.
    pub task_id: String,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ActiveArgs {
    /// Worker to check; defaults to `default_worker` from the config.
    #[arg(long, short)]
    pub worker: Option<String>,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn show<W: Write>(
    writer: &mut W,
    db: &Database,
    args: &ShowArgs,
    now: Timestamp,
) -> Result<()> {
    let snapshot = db.task_snapshot_at(&TaskId::new(args.task_id.as_str())?, now)?;
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&snapshot)?)?;
        return Ok(());
    }

    let task = &snapshot.task;
    let optional = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    writeln!(writer, "Task:     {}", task.id)?;
    writeln!(writer, "Status:   {}", task.status)?;
    writeln!(writer, "Order:    {}", task.order_id)?;
    writeln!(writer, "Resource: {}", task.resource_id)?;
    writeln!(writer, "Service:  {} ({})", task.service_name, task.service_id)?;
    writeln!(
        writer,
        "Worker:   {}",
        optional(task.assigned_worker_id.as_ref().map(ToString::to_string))
    )?;
    writeln!(
        writer,
        "Started:  {}",
        optional(task.started_at.map(|t| t.to_string()))
    )?;
    writeln!(
        writer,
        "Ended:    {}",
        optional(task.ended_at.map(|t| t.to_string()))
    )?;
    writeln!(
        writer,
        "Active:   {}",
        format_duration(snapshot.live_duration_seconds)
    )?;
    writeln!(
        writer,
        "Estimate: {} x {:.2}h at {:.2} = {:.2}",
        task.estimated_quantity, task.estimated_hours, task.unit_price, task.estimated_cost
    )?;
    if let Some(actuals) = task.actuals {
        writeln!(
            writer,
            "Actual:   {:.2}h = {:.2} (variance {}, {}%)",
            actuals.actual_hours,
            actuals.actual_cost,
            signed(actuals.cost_variance),
            signed(actuals.variance_percent)
        )?;
    }
    Ok(())
}

pub fn events<W: Write>(writer: &mut W, db: &Database, args: &EventsArgs) -> Result<()> {
    let events = db.list_task_events(&TaskId::new(args.task_id.as_str())?)?;
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&events)?)?;
        return Ok(());
    }

    if events.is_empty() {
        writeln!(writer, "No events recorded.")?;
        return Ok(());
    }
    for event in events {
        let elapsed = match (event.event_type, event.elapsed_seconds) {
            (EventType::Pause, None) => "open".to_string(),
            (EventType::Pause, Some(seconds)) => format!("paused {}", format_duration(seconds)),
            (EventType::Stop, Some(seconds)) => format!("active {}", format_duration(seconds)),
            _ => String::new(),
        };
        let line = format!(
            "{}  {:<6}  {:<10}  {}",
            event.event_timestamp,
            event.event_type.as_str(),
            event.user_id.as_str(),
            elapsed
        );
        writeln!(writer, "{}", line.trim_end())?;
    }
    Ok(())
}

pub fn active<W: Write>(
    writer: &mut W,
    db: &Database,
    args: &ActiveArgs,
    worker: &WorkerId,
) -> Result<()> {
    let check = db.check_active_task(worker)?;
    if args.json {
        writeln!(writer, "{}", serde_json::to_string(&check)?)?;
        return Ok(());
    }
    match check.task_id {
        Some(task_id) => writeln!(writer, "{worker}: task {task_id}")?,
        None => writeln!(writer, "{worker} has no active task.")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use shop_core::{OrderId, ResourceId, ServiceDefinition, ServiceId};
    use shop_db::StartRequest;

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_epoch_seconds(seconds)
    }

    /// A task started at 4000 and paused at 5000.
    fn paused_task() -> (Database, TaskId) {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_order(&OrderId::new("WO-9").unwrap(), None)
            .unwrap();
        db.upsert_service(&ServiceDefinition {
            id: ServiceId::new("deburr").unwrap(),
            name: "Deburring".to_string(),
            default_quantity: 2.0,
            default_hours: 0.5,
            default_unit_price: 30.0,
        })
        .unwrap();
        db.upsert_resource(&ResourceId::new("bench-3").unwrap(), Some("Bench 3"))
            .unwrap();
        let ana = WorkerId::new("ana").unwrap();
        let task_id = db
            .start_task_at(
                &StartRequest {
                    order_id: OrderId::new("WO-9").unwrap(),
                    resource_id: ResourceId::new("bench-3").unwrap(),
                    service_id: ServiceId::new("deburr").unwrap(),
                    worker_id: ana.clone(),
                },
                at(4000),
            )
            .unwrap()
            .task
            .id;
        db.pause_task_at(&task_id, &ana, at(5000)).unwrap();
        (db, task_id)
    }

    #[test]
    fn show_paused_task_counts_open_pause_once() {
        let (db, task_id) = paused_task();
        let mut output = Vec::new();
        let args = ShowArgs {
            task_id: task_id.to_string(),
            json: false,
        };
        show(&mut output, &db, &args, at(5300)).unwrap();

        let output = String::from_utf8(output)
            .unwrap()
            .replace(task_id.as_str(), "[task]");
        assert_snapshot!(output, @r"
        Task:     [task]
        Status:   paused
        Order:    WO-9
        Resource: bench-3
        Service:  Deburring (deburr)
        Worker:   ana
        Started:  1970-01-01T01:06:40Z
        Ended:    -
        Active:   16m 40s
        Estimate: 2 x 0.50h at 30.00 = 60.00
        ");
    }

    #[test]
    fn show_json_includes_live_duration() {
        let (db, task_id) = paused_task();
        let mut output = Vec::new();
        let args = ShowArgs {
            task_id: task_id.to_string(),
            json: true,
        };
        show(&mut output, &db, &args, at(5300)).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["live_duration_seconds"], 1000);
        assert_eq!(json["status"], "paused");
        assert_eq!(json["id"], task_id.as_str());
    }

    #[test]
    fn events_lists_log_with_open_pause() {
        let (db, task_id) = paused_task();
        let mut output = Vec::new();
        let args = EventsArgs {
            task_id: task_id.to_string(),
            json: false,
        };
        events(&mut output, &db, &args).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        1970-01-01T01:06:40Z  start   ana
        1970-01-01T01:23:20Z  pause   ana         open
        ");
    }

    #[test]
    fn active_reports_running_session() {
        let (db, task_id) = paused_task();
        let args = ActiveArgs {
            worker: None,
            json: true,
        };

        let mut output = Vec::new();
        active(&mut output, &db, &args, &WorkerId::new("ana").unwrap()).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output.trim(),
            format!(r#"{{"has_active":true,"task_id":"{task_id}"}}"#)
        );

        let mut output = Vec::new();
        active(&mut output, &db, &args, &WorkerId::new("ben").unwrap()).unwrap();
        assert_eq!(String::from_utf8(output).unwrap().trim(), r#"{"has_active":false}"#);
    }

    #[test]
    fn unknown_task_is_reported() {
        let (db, _) = paused_task();
        let mut output = Vec::new();
        let args = EventsArgs {
            task_id: "nope".to_string(),
            json: false,
        };
        let err = events(&mut output, &db, &args).unwrap_err();
        assert_eq!(err.to_string(), "task not found: nope");
    }
}
