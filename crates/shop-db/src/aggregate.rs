//! Order-level cost rollup.

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use shop_core::{OrderId, TaskStatus, Timestamp, round2};

use crate::{Database, DbError};

/// Task counts per status for one order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub planned: u32,
    pub in_progress: u32,
    pub paused: u32,
    pub completed: u32,
    pub cancelled: u32,
}

/// Estimated and actual cost of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderCostSummary {
    pub order_id: OrderId,
    pub name: Option<String>,
    pub estimated_cost_total: f64,
    /// The stored rollup written by the last stop or cancel.
    pub actual_cost_total: f64,
    /// `actual_cost_total - estimated_cost_total`.
    pub cost_variance: f64,
    pub tasks: TaskCounts,
}

/// Recomputes and stores an order's actual cost from its tasks.
///
/// Only completed and in-progress tasks with a recorded cost contribute.
/// Runs inside the caller's transaction.
pub(crate) fn recompute_order_actual_cost(
    conn: &Connection,
    order_id: &OrderId,
    now: Timestamp,
) -> Result<f64, DbError> {
    let sum: f64 = conn.query_row(
        "
        SELECT COALESCE(SUM(actual_cost), 0)
        FROM tasks
        WHERE order_id = ?
          AND status IN ('completed', 'in_progress')
          AND actual_cost IS NOT NULL
        ",
        [order_id.as_str()],
        |row| row.get(0),
    )?;
    let total = round2(sum);
    let updated = conn.execute(
        "UPDATE orders SET actual_cost_total = ?, updated_at = ? WHERE id = ?",
        params![total, now.epoch_seconds(), order_id.as_str()],
    )?;
    if updated == 0 {
        return Err(DbError::not_found("order", order_id));
    }
    tracing::debug!(order_id = %order_id, total, "order actual cost recomputed");
    Ok(total)
}

impl Database {
    /// Summarizes an order's estimated and actual cost.
    pub fn order_cost_summary(&self, order_id: &OrderId) -> Result<OrderCostSummary, DbError> {
        let order: Option<(Option<String>, f64)> = self
            .conn
            .query_row(
                "SELECT name, actual_cost_total FROM orders WHERE id = ?",
                [order_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((name, actual_cost_total)) = order else {
            return Err(DbError::not_found("order", order_id));
        };

        let estimated_cost_total: f64 = self.conn.query_row(
            "
            SELECT COALESCE(SUM(estimated_cost), 0)
            FROM tasks
            WHERE order_id = ? AND status != 'cancelled'
            ",
            [order_id.as_str()],
            |row| row.get(0),
        )?;

        let mut tasks = TaskCounts::default();
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM tasks WHERE order_id = ? GROUP BY status")?;
        let rows = stmt.query_map([order_id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            let slot = match status.parse::<TaskStatus>()? {
                TaskStatus::Planned => &mut tasks.planned,
                TaskStatus::InProgress => &mut tasks.in_progress,
                TaskStatus::Paused => &mut tasks.paused,
                TaskStatus::Completed => &mut tasks.completed,
                TaskStatus::Cancelled => &mut tasks.cancelled,
            };
            *slot = count;
        }

        let estimated_cost_total = round2(estimated_cost_total);
        Ok(OrderCostSummary {
            order_id: order_id.clone(),
            name,
            estimated_cost_total,
            actual_cost_total,
            cost_variance: round2(actual_cost_total - estimated_cost_total),
            tasks,
        })
    }
}
