//! Registration commands for orders, catalog services and workstations.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;

use shop_core::{OrderId, ResourceId, ServiceDefinition, ServiceId};
use shop_db::Database;

#[derive(Debug, Args)]
pub struct OrderAddArgs {
    /// Order ID (e.g. WO-1042).
    pub order_id: String,
    /// Display name.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct ServiceAddArgs {
    /// Service ID (e.g. laser-cut).
    pub service_id: String,
    /// Display name copied onto tasks.
    #[arg(long)]
    pub name: String,
    /// Default quantity for new tasks.
    #[arg(long, default_value_t = 1.0)]
    pub quantity: f64,
    /// Default estimated hours for new tasks.
    #[arg(long)]
    pub hours: f64,
    /// Default unit price for new tasks.
    #[arg(long)]
    pub price: f64,
}

#[derive(Debug, Args)]
pub struct ResourceAddArgs {
    /// Workstation ID (e.g. laser-1).
    pub resource_id: String,
    /// Display name.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct MaintenanceArgs {
    /// Workstation ID.
    pub resource_id: String,
    /// Return the workstation to service instead.
    #[arg(long)]
    pub off: bool,
}

pub fn add_order<W: Write>(writer: &mut W, db: &mut Database, args: &OrderAddArgs) -> Result<()> {
    let order_id = OrderId::new(args.order_id.as_str())?;
    db.upsert_order(&order_id, args.name.as_deref())?;
    writeln!(writer, "Registered order {order_id}")?;
    Ok(())
}

pub fn add_service<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &ServiceAddArgs,
) -> Result<()> {
    for (flag, value) in [
        ("--quantity", args.quantity),
        ("--hours", args.hours),
        ("--price", args.price),
    ] {
        if !value.is_finite() || value < 0.0 {
            bail!("{flag} must be a non-negative number, got {value}");
        }
    }
    if args.name.trim().is_empty() {
        bail!("--name cannot be empty");
    }

    let service = ServiceDefinition {
        id: ServiceId::new(args.service_id.as_str())?,
        name: args.name.trim().to_string(),
        default_quantity: args.quantity,
        default_hours: args.hours,
        default_unit_price: args.price,
    };
    db.upsert_service(&service)
        .with_context(|| format!("failed to register service {}", service.id))?;
    writeln!(
        writer,
        "Registered service {} ({}): {} x {:.2}h at {:.2}",
        service.id,
        service.name,
        service.default_quantity,
        service.default_hours,
        service.default_unit_price
    )?;
    Ok(())
}

pub fn add_resource<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &ResourceAddArgs,
) -> Result<()> {
    let resource_id = ResourceId::new(args.resource_id.as_str())?;
    db.upsert_resource(&resource_id, args.name.as_deref())?;
    let resource = db.get_resource(&resource_id)?;
    writeln!(
        writer,
        "Registered resource {} ({})",
        resource.id, resource.occupancy_status
    )?;
    Ok(())
}

pub fn maintenance<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: &MaintenanceArgs,
) -> Result<()> {
    let resource_id = ResourceId::new(args.resource_id.as_str())?;
    let resource = db.set_maintenance(&resource_id, !args.off)?;
    writeln!(
        writer,
        "Resource {} is now {}",
        resource.id, resource.occupancy_status
    )?;
    Ok(())
}
