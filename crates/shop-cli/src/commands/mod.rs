//! CLI subcommand implementations.

pub mod admin;
pub mod clock;
pub mod doctor;
pub mod floor;
pub mod init;
pub mod task;
pub mod util;
