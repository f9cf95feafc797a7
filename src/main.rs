use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use noor::cli::args::{Cli, Commands};
use noor::cli::handlers::{self, SetupArgs};
use noor::config::AppConfig;
use noor::db::migrations::run_migrations;
use noor::db::repository::MetaRepo;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("Loading config")?;

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    match cli.command {
        Some(Commands::Setup {
            lat,
            lng,
            name,
            method,
            madhab,
            tz,
        }) => {
            let args = SetupArgs {
                lat,
                lng,
                name,
                method,
                madhab,
                tz,
            };
            handlers::handle_setup(&conn, &mut config, args)?;
        }
        Some(Commands::Config) => {
            handlers::handle_config(&config)?;
        }
        Some(Commands::Adhkar { action }) => {
            handlers::handle_adhkar(&conn, &action)?;
        }
        Some(cmd) => {
            warn_if_not_setup(&conn, &config)?;
            match cmd {
                Commands::Times { anchor, date } => {
                    handlers::handle_times(&conn, &config, anchor.as_deref(), date)?;
                }
                Commands::Schedule {
                    date,
                    json,
                    required_only,
                    refresh,
                } => {
                    handlers::handle_schedule(&conn, &config, date, json, required_only, refresh)?;
                }
                Commands::Done { name, date, undo } => {
                    handlers::handle_done(&conn, &config, &name, date, undo)?;
                }
                Commands::Move { name, time, date } => {
                    handlers::handle_move(&conn, &config, &name, &time, date)?;
                }
                Commands::Setup { .. } | Commands::Config | Commands::Adhkar { .. } => {
                    unreachable!()
                }
            }
        }

        // No subcommand → today's schedule
        None => {
            warn_if_not_setup(&conn, &config)?;
            handlers::handle_schedule(&conn, &config, None, false, false, false)?;
        }
    }

    Ok(())
}

/// Prayer times need a location; point first-time users at `noor setup`.
fn warn_if_not_setup(conn: &Connection, config: &AppConfig) -> Result<()> {
    let done = MetaRepo::get(conn, "setup_done")?;
    if done.as_deref() != Some("1") {
        eprintln!(
            "No location configured; using {}. Run `noor setup --lat <deg> --lng <deg>` to set yours.",
            config.location.name
        );
        eprintln!();
    }
    Ok(())
}
