//! Shop-floor CLI library.
//!
//! This crate provides the `shop` command-line interface over the allocation engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, OrderAction, ResourceAction, ServiceAction, TaskAction};
pub use config::Config;
