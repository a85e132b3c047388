//! `daynote` command line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the database.
//! - Hand the parsed command to `cli::run`.

mod cli;
mod config;
mod editor;

use chrono::Local;
use clap::Parser;
use cli::Cli;
use color_eyre::eyre::{eyre, Result, WrapErr};
use config::Config;
use daynote_core::db::open_db;
use daynote_core::init_logging;
use std::fs;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let log_dir = std::path::absolute(&config.log_dir)
        .wrap_err_with(|| format!("invalid log_dir `{}`", config.log_dir.display()))?;
    init_logging(&config.log_level, &log_dir.to_string_lossy()).map_err(|err| eyre!(err))?;

    if let Some(parent) = config.database_path.parent() {
        fs::create_dir_all(parent).wrap_err_with(|| {
            format!("failed to create database directory `{}`", parent.display())
        })?;
    }
    let conn = open_db(&config.database_path)
        .wrap_err_with(|| format!("failed to open `{}`", config.database_path.display()))?;

    let today = Local::now().date_naive();
    cli::run(cli.command, &conn, &config, today)
}
