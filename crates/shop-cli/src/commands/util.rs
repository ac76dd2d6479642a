//! Formatting helpers shared by commands.

use anyhow::{Context, Result, bail};

use shop_core::WorkerId;

/// Picks the acting worker from `--worker`, falling back to the configured default.
pub fn resolve_worker(flag: Option<&str>, default: Option<&str>) -> Result<WorkerId> {
    let Some(raw) = flag.or(default) else {
        bail!("no worker given: pass --worker or set default_worker in the config");
    };
    WorkerId::new(raw).context("invalid worker")
}

/// Formats seconds as `1h 5m`, `12m 30s` or `45s`.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "0s".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else if minutes >= 1 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Formats a money or hours figure with an explicit sign.
pub fn signed(value: f64) -> String {
    format!("{value:+.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_picks_largest_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(-5), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(750), "12m 30s");
        assert_eq!(format_duration(7200), "2h 0m");
        assert_eq!(format_duration(3900), "1h 5m");
    }

    #[test]
    fn worker_flag_wins_over_default() {
        let worker = resolve_worker(Some("ben"), Some("ana")).unwrap();
        assert_eq!(worker.as_str(), "ben");
        let worker = resolve_worker(None, Some("ana")).unwrap();
        assert_eq!(worker.as_str(), "ana");
    }

    #[test]
    fn missing_worker_is_an_error() {
        let err = resolve_worker(None, None).unwrap_err();
        assert!(err.to_string().contains("--worker"));
        assert!(resolve_worker(Some("  "), None).is_err());
    }

    #[test]
    fn signed_always_shows_sign() {
        assert_eq!(signed(50.0), "+50.00");
        assert_eq!(signed(-0.5), "-0.50");
    }
}
