//! Doctor command for auditing workstation occupancy.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;

use shop_db::Database;

#[derive(Debug, Args)]
pub struct DoctorArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Prints every occupancy invariant violation and fails if there are any.
pub fn run<W: Write>(writer: &mut W, db: &Database, args: &DoctorArgs) -> Result<()> {
    let violations = db.check_occupancy_invariants()?;
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&violations)?)?;
    } else if violations.is_empty() {
        writeln!(writer, "No occupancy problems found.")?;
    } else {
        for violation in &violations {
            writeln!(writer, "- {violation}")?;
        }
    }

    if !violations.is_empty() {
        bail!("{} occupancy invariant violation(s)", violations.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use shop_core::ResourceId;

    #[test]
    fn clean_floor_passes() {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_resource(&ResourceId::new("saw-1").unwrap(), None)
            .unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, &DoctorArgs { json: false }).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @"No occupancy problems found.");
    }

    #[test]
    fn empty_database_reports_empty_json() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, &DoctorArgs { json: true }).unwrap();
        assert_eq!(String::from_utf8(output).unwrap().trim(), "[]");
    }
}
