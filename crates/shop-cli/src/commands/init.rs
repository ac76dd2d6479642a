//! Init command for creating the database.

use std::io::Write;

use anyhow::{Context, Result};

use shop_db::Database;

use crate::Config;

/// Creates the database file and schema if missing.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open_with_timeout(&config.database_path, config.busy_timeout())
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;

    writeln!(writer, "Database: {}", config.database_path.display())?;
    match &config.default_worker {
        Some(worker) => writeln!(writer, "Default worker: {worker}")?,
        None => writeln!(writer, "Default worker: (none, pass --worker)")?,
    }
    Ok(())
}
