use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use shop_core::{Timestamp, WorkerId};
use shop_cli::commands::{admin, clock, doctor, floor, init, task, util};
use shop_cli::{Cli, Commands, Config, OrderAction, ResourceAction, ServiceAction, TaskAction};
use shop_db::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = load_config(config_path)?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open_with_timeout(&config.database_path, config.busy_timeout())
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((db, config))
}

/// Open the database and resolve the acting worker from the flag or config.
fn open_as_worker(
    config_path: Option<&Path>,
    flag: Option<&str>,
) -> Result<(Database, WorkerId)> {
    let (db, config) = open_database(config_path)?;
    let worker = util::resolve_worker(flag, config.default_worker.as_deref())?;
    Ok((db, worker))
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so command output stays pipeable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let config_path = cli.config.as_deref();

    match command {
        Commands::Init => {
            let config = load_config(config_path)?;
            init::run(&mut out, &config)?;
        }
        Commands::Order(action) => {
            let (mut db, _config) = open_database(config_path)?;
            match action {
                OrderAction::Add(args) => admin::add_order(&mut out, &mut db, args)?,
                OrderAction::Summary(args) => floor::order_summary(&mut out, &db, args)?,
            }
        }
        Commands::Service(ServiceAction::Add(args)) => {
            let (mut db, _config) = open_database(config_path)?;
            admin::add_service(&mut out, &mut db, args)?;
        }
        Commands::Resource(action) => {
            let (mut db, _config) = open_database(config_path)?;
            match action {
                ResourceAction::Add(args) => admin::add_resource(&mut out, &mut db, args)?,
                ResourceAction::List(args) => floor::list_resources(&mut out, &db, args)?,
                ResourceAction::Maintenance(args) => admin::maintenance(&mut out, &mut db, args)?,
            }
        }
        Commands::Start(args) => {
            let (mut db, worker) = open_as_worker(config_path, args.worker.as_deref())?;
            clock::start(&mut out, &mut db, args, &worker, Timestamp::now())?;
        }
        Commands::Pause(args) => {
            let (mut db, worker) = open_as_worker(config_path, args.worker.as_deref())?;
            clock::pause(&mut out, &mut db, args, &worker, Timestamp::now())?;
        }
        Commands::Resume(args) => {
            let (mut db, worker) = open_as_worker(config_path, args.worker.as_deref())?;
            clock::resume(&mut out, &mut db, args, &worker, Timestamp::now())?;
        }
        Commands::Stop(args) => {
            let (mut db, worker) = open_as_worker(config_path, args.worker.as_deref())?;
            clock::stop(&mut out, &mut db, args, &worker, Timestamp::now())?;
        }
        Commands::Cancel(args) => {
            let (mut db, worker) = open_as_worker(config_path, args.worker.as_deref())?;
            clock::cancel(&mut out, &mut db, args, &worker, Timestamp::now())?;
        }
        Commands::Task(action) => {
            let (db, _config) = open_database(config_path)?;
            match action {
                TaskAction::Show(args) => task::show(&mut out, &db, args, Timestamp::now())?,
                TaskAction::Events(args) => task::events(&mut out, &db, args)?,
            }
        }
        Commands::Active(args) => {
            let (db, worker) = open_as_worker(config_path, args.worker.as_deref())?;
            task::active(&mut out, &db, args, &worker)?;
        }
        Commands::Doctor(args) => {
            let (db, _config) = open_database(config_path)?;
            doctor::run(&mut out, &db, args)?;
        }
    }

    out.flush()?;
    Ok(())
}
