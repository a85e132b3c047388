//! Command line surface and command handlers.

use crate::config::Config;
use crate::editor::edit_text;
use chrono::{NaiveDate, TimeDelta};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use daynote_core::sheet::{self, render_summary};
use daynote_core::{
    DayNotesService, DayRepository, NoteId, ScheduleRepository, SqliteDayRepository,
    SqliteNoteRepository, SqliteScheduleRepository,
};
use log::info;
use rusqlite::Connection;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "daynote")]
#[command(about = "Daily notes and tasks, one sheet per day")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Check whether today needs notes: edit when empty, show otherwise
    Check,
    /// Add a note to a day
    New {
        /// Note text
        body: String,
        /// Day offset from today (negative for past days)
        #[arg(short, long, allow_hyphen_values = true)]
        day: Option<i64>,
    },
    /// Show a day, or a week/month around it
    Show {
        /// Day offset from today (negative for past days)
        #[arg(short, long, allow_hyphen_values = true)]
        day: Option<i64>,
        #[command(subcommand)]
        period: Option<Period>,
    },
    /// Edit a day's sheet in $EDITOR
    Edit {
        /// Day offset from today (negative for past days)
        #[arg(short, long, allow_hyphen_values = true)]
        day: Option<i64>,
    },
    /// Mark a note as done
    Complete { id: NoteId },
    /// Remove a note (kept as a tombstone)
    Delete { id: NoteId },
    /// Manage recurring schedule slots
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Verify stored task counters against the notes
    Doctor {
        /// Rewrite drifted counters
        #[arg(long)]
        repair: bool,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Seven days either side
    Week,
    /// Thirty days either side
    Month,
}

impl Period {
    pub fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ScheduleAction {
    /// Store a slot; values are kept verbatim
    Add {
        hour: String,
        day: String,
        week: String,
    },
    /// List all slots
    List,
}

/// Resolves a day offset relative to `today`.
pub fn resolve_date(today: NaiveDate, offset: Option<i64>) -> Result<NaiveDate> {
    let offset = offset.unwrap_or(0);
    TimeDelta::try_days(offset)
        .and_then(|delta| today.checked_add_signed(delta))
        .ok_or_else(|| eyre!("day offset {offset} is out of range"))
}

/// Executes one command against an opened database.
pub fn run(command: Commands, conn: &Connection, config: &Config, today: NaiveDate) -> Result<()> {
    let service = DayNotesService::new(
        SqliteDayRepository::try_new(conn)?,
        SqliteNoteRepository::try_new(conn)?,
    );

    match command {
        Commands::Check => {
            let current = service.day_notes(today)?;
            if current.is_empty() {
                edit_day(&service, config, today, today)?;
            } else {
                print!("{}", render_summary(&current, today));
            }
        }
        Commands::New { body, day } => {
            let date = resolve_date(today, day)?;
            let note = service.add_note(date, &body)?;
            println!("Added note {} to {date}.", note.id);
        }
        Commands::Show { day, period } => {
            let date = resolve_date(today, day)?;
            match period {
                None => print!("{}", render_summary(&service.day_notes(date)?, today)),
                Some(period) => {
                    let start = resolve_date(date, Some(-period.days()))?;
                    let end = resolve_date(date, Some(period.days()))?;
                    let days = service.range(start, end)?;
                    if days.is_empty() {
                        println!("No notes between {start} and {end}.");
                    }
                    let rendered: Vec<_> =
                        days.iter().map(|day| render_summary(day, today)).collect();
                    print!("{}", rendered.join("\n"));
                }
            }
        }
        Commands::Edit { day } => {
            let date = resolve_date(today, day)?;
            edit_day(&service, config, date, today)?;
        }
        Commands::Complete { id } => {
            let note = service.complete_note(id)?;
            println!("Completed note {}.", note.id);
        }
        Commands::Delete { id } => {
            service.soft_delete_note(id)?;
            println!("Deleted note {id}.");
        }
        Commands::Schedule { action } => run_schedule(action, conn)?,
        Commands::Doctor { repair } => run_doctor(repair, conn)?,
    }
    Ok(())
}

fn edit_day(
    service: &DayNotesService<SqliteDayRepository<'_>, SqliteNoteRepository<'_>>,
    config: &Config,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<()> {
    let initial = sheet::render(&service.day_notes(date)?, today);
    let edited = edit_text(&config.editor_command(), &initial)?;
    let applied = service.apply_sheet(&sheet::parse(&edited)?)?;
    info!(
        "event=sheet_edit module=cli status=ok created={} updated={} deleted={}",
        applied.created, applied.updated, applied.deleted
    );
    print!("{}", render_summary(&applied.day, today));
    Ok(())
}

fn run_schedule(action: ScheduleAction, conn: &Connection) -> Result<()> {
    let schedules = SqliteScheduleRepository::try_new(conn)?;
    match action {
        ScheduleAction::Add { hour, day, week } => {
            let schedule = schedules.create_schedule(&hour, &day, &week)?;
            println!("Added schedule {}.", schedule.id);
        }
        ScheduleAction::List => {
            let all = schedules.list_schedules()?;
            if all.is_empty() {
                println!("No schedules.");
            }
            for schedule in all {
                println!(
                    "{}\thour={}\tday={}\tweek={}",
                    schedule.id, schedule.hour, schedule.day, schedule.week
                );
            }
        }
    }
    Ok(())
}

fn run_doctor(repair: bool, conn: &Connection) -> Result<()> {
    let days = SqliteDayRepository::try_new(conn)?;
    let drifts = days.audit_task_counts()?;
    if drifts.is_empty() {
        println!("All task counters are consistent.");
        return Ok(());
    }

    for drift in &drifts {
        println!(
            "{}: stored {} but {} active note(s)",
            drift.date, drift.stored, drift.actual
        );
    }
    if repair {
        let fixed = days.repair_task_counts()?;
        println!("Repaired {fixed} day(s).");
    }
    Ok(())
}
