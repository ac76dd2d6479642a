//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::admin::{MaintenanceArgs, OrderAddArgs, ResourceAddArgs, ServiceAddArgs};
use crate::commands::clock::{StartArgs, TaskArgs};
use crate::commands::doctor::DoctorArgs;
use crate::commands::floor::{ListArgs, SummaryArgs};
use crate::commands::task::{ActiveArgs, EventsArgs, ShowArgs};

/// Shop-floor time tracking.
///
/// Clocks operators in and out of workstations, keeps one task per
/// workstation and bills active time against production orders.
#[derive(Debug, Parser)]
#[command(name = "shop", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the database.
    Init,

    /// Manage production orders.
    #[command(subcommand)]
    Order(OrderAction),

    /// Manage the service catalog.
    #[command(subcommand)]
    Service(ServiceAction),

    /// Manage workstations.
    #[command(subcommand)]
    Resource(ResourceAction),

    /// Clock in on a workstation.
    Start(StartArgs),

    /// Pause a running task.
    Pause(TaskArgs),

    /// Resume a paused task.
    Resume(TaskArgs),

    /// Clock out and bill the task.
    Stop(TaskArgs),

    /// Cancel a task without billing it.
    Cancel(TaskArgs),

    /// Inspect tasks.
    #[command(subcommand)]
    Task(TaskAction),

    /// Show a worker's running task.
    Active(ActiveArgs),

    /// Check workstation occupancy against task status.
    Doctor(DoctorArgs),
}

#[derive(Debug, Subcommand)]
pub enum OrderAction {
    /// Register an order.
    Add(OrderAddArgs),
    /// Show estimated against actual cost.
    Summary(SummaryArgs),
}

#[derive(Debug, Subcommand)]
pub enum ServiceAction {
    /// Add or update a catalog entry.
    Add(ServiceAddArgs),
}

#[derive(Debug, Subcommand)]
pub enum ResourceAction {
    /// Register a workstation.
    Add(ResourceAddArgs),
    /// List workstations with their occupancy.
    List(ListArgs),
    /// Put an idle workstation into maintenance, or back with --off.
    Maintenance(MaintenanceArgs),
}

#[derive(Debug, Subcommand)]
pub enum TaskAction {
    /// Show a task with its live duration.
    Show(ShowArgs),
    /// List a task's event log.
    Events(EventsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_start_with_worker() {
        let cli = Cli::try_parse_from([
            "shop", "start", "laser-1", "--order", "WO-1", "--service", "laser-cut", "-w", "ana",
        ])
        .unwrap();
        let Some(Commands::Start(args)) = cli.command else {
            panic!("expected start");
        };
        assert_eq!(args.resource_id, "laser-1");
        assert_eq!(args.worker.as_deref(), Some("ana"));
    }

    #[test]
    fn start_requires_order_and_service() {
        assert!(Cli::try_parse_from(["shop", "start", "laser-1"]).is_err());
    }
}
