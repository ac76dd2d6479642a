//! Clock in, pause, resume and clock out on a workstation.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use shop_core::{OrderId, ResourceId, ServiceId, TaskId, Timestamp, WorkerId};
use shop_db::{Database, StartDisposition, StartRequest};

use super::util::{format_duration, signed};

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Workstation to clock in on.
    pub resource_id: String,
    /// Production order the work belongs to.
    #[arg(long)]
    pub order: String,
    /// Catalog service being performed.
    #[arg(long)]
    pub service: String,
    /// Acting worker; defaults to `default_worker` from the config.
    #[arg(long, short)]
    pub worker: Option<String>,
}

#[derive(Debug, Args)]
pub struct TaskArgs {
    /// Task ID returned by `shop start`.
    pub task_id: String,
    /// Acting worker; defaults to `default_worker` from the config.
    #[arg(long, short)]
    pub worker: Option<String>,
}

pub fn start<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &StartArgs,
    worker: &WorkerId,
    now: Timestamp,
) -> Result<()> {
    let request = StartRequest {
        order_id: OrderId::new(args.order.as_str())?,
        resource_id: ResourceId::new(args.resource_id.as_str())?,
        service_id: ServiceId::new(args.service.as_str())?,
        worker_id: worker.clone(),
    };
    let outcome = db.start_task_at(&request, now)?;
    let task = &outcome.task;

    match outcome.disposition {
        StartDisposition::Created | StartDisposition::Reused => {
            writeln!(
                writer,
                "Started task {} on {} ({})",
                task.id, task.resource_id, task.service_name
            )?;
        }
        StartDisposition::AlreadyRunning => {
            writeln!(
                writer,
                "Task {} already holds {} ({})",
                task.id, task.resource_id, task.status
            )?;
        }
    }
    writeln!(writer, "Order:  {}", task.order_id)?;
    writeln!(writer, "Worker: {worker}")?;
    Ok(())
}

pub fn pause<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &TaskArgs,
    worker: &WorkerId,
    now: Timestamp,
) -> Result<()> {
    let task = db.pause_task_at(&TaskId::new(args.task_id.as_str())?, worker, now)?;
    writeln!(
        writer,
        "Paused task {} on {} at {now}",
        task.id, task.resource_id
    )?;
    Ok(())
}

pub fn resume<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &TaskArgs,
    worker: &WorkerId,
    now: Timestamp,
) -> Result<()> {
    let task = db.resume_task_at(&TaskId::new(args.task_id.as_str())?, worker, now)?;
    writeln!(
        writer,
        "Resumed task {} on {} at {now}",
        task.id, task.resource_id
    )?;
    Ok(())
}

pub fn stop<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &TaskArgs,
    worker: &WorkerId,
    now: Timestamp,
) -> Result<()> {
    let outcome = db.stop_task_at(&TaskId::new(args.task_id.as_str())?, worker, now)?;
    let task = &outcome.task;

    writeln!(writer, "Completed task {} on {}", task.id, task.resource_id)?;
    writeln!(
        writer,
        "Active: {}",
        format_duration(outcome.run.active_seconds)
    )?;
    writeln!(
        writer,
        "Paused: {}",
        format_duration(outcome.run.total_pause_seconds())
    )?;
    if let Some(actuals) = task.actuals {
        writeln!(
            writer,
            "Hours:  {:.2} (estimated {:.2}, variance {} / {}%)",
            actuals.actual_hours,
            task.estimated_hours,
            signed(actuals.time_variance_hours),
            signed(actuals.variance_percent)
        )?;
        writeln!(
            writer,
            "Cost:   {:.2} (estimated {:.2}, variance {})",
            actuals.actual_cost,
            task.estimated_cost,
            signed(actuals.cost_variance)
        )?;
    }
    writeln!(
        writer,
        "Order {} actual cost: {:.2}",
        task.order_id, outcome.order_actual_cost_total
    )?;
    Ok(())
}

pub fn cancel<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &TaskArgs,
    worker: &WorkerId,
    now: Timestamp,
) -> Result<()> {
    let outcome = db.cancel_task_at(&TaskId::new(args.task_id.as_str())?, worker, now)?;
    let task = &outcome.task;

    writeln!(writer, "Cancelled task {} on {}", task.id, task.resource_id)?;
    match outcome.active_seconds {
        Some(seconds) => writeln!(writer, "Active: {} (not billed)", format_duration(seconds))?,
        None => writeln!(writer, "Active: unknown (event log incomplete)")?,
    }
    writeln!(
        writer,
        "Order {} actual cost: {:.2}",
        task.order_id, outcome.order_actual_cost_total
    )?;
    Ok(())
}
