//! Actual hours, cost and variance derived from active seconds.

use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Planning figures a task was created with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimates {
    pub estimated_hours: f64,
    pub unit_price: f64,
    pub estimated_cost: f64,
}

/// Figures computed when a task is stopped. Every value is rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actuals {
    pub actual_hours: f64,
    pub actual_cost: f64,
    /// `actual_hours - estimated_hours`.
    pub time_variance_hours: f64,
    /// `actual_cost - estimated_cost`.
    pub cost_variance: f64,
    /// Time variance relative to the estimate; 0 when nothing was estimated.
    pub variance_percent: f64,
}

impl Actuals {
    /// Derives actuals for `active_seconds` of work.
    ///
    /// Cost is billed on the rounded hours so the stored figures reproduce
    /// from each other.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_active_seconds(active_seconds: i64, estimates: &Estimates) -> Self {
        let actual_hours = round2(active_seconds.max(0) as f64 / SECONDS_PER_HOUR);
        let actual_cost = round2(actual_hours * estimates.unit_price);
        let variance_hours = actual_hours - estimates.estimated_hours;
        let time_variance_hours = round2(variance_hours);
        let variance_percent = if estimates.estimated_hours == 0.0 {
            0.0
        } else {
            round2(variance_hours / estimates.estimated_hours * 100.0)
        };
        let cost_variance = round2(actual_cost - estimates.estimated_cost);

        Self {
            actual_hours,
            actual_cost,
            time_variance_hours,
            cost_variance,
            variance_percent,
        }
    }
}

/// Rounds half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
