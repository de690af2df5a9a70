//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `todo_core` wiring end to end: open, seed, list, aggregate.
//! - Keep stdout machine-readable: exactly one pretty JSON document
//!   `{"todos": [...], "stats": {...}}`. Diagnostics go to the log or stderr.
//!
//! Usage: `todo_cli [DB_PATH]`. Without a path an in-memory store is used.
//! Set `TODO_LOG_DIR` to an absolute directory to enable file logging.

use rusqlite::Connection;
use serde_json::json;
use std::error::Error;
use std::io::Write;
use std::process::ExitCode;
use todo_core::db::{open_db, open_db_in_memory};
use todo_core::{
    default_log_level, init_logging, SqliteTodoRepository, TodoListQuery, TodoService,
};

const LOG_DIR_ENV: &str = "TODO_LOG_DIR";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("todo_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        init_logging(default_log_level(), &log_dir)?;
    }

    log::info!(
        "event=cli_start module=cli status=ok ping={} version={}",
        todo_core::ping(),
        todo_core::core_version()
    );

    let mut conn = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let stdout = std::io::stdout();
    write_report(&mut conn, &mut stdout.lock())
}

/// Seeds an empty store, then writes the list and stats as one JSON document.
fn write_report(conn: &mut Connection, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let repo = SqliteTodoRepository::try_new(conn)?;
    let mut service = TodoService::new(repo);

    if service.count_todos()? == 0 {
        let seeded = service.seed_samples()?;
        log::info!(
            "event=cli_seed module=cli status=ok count={}",
            seeded.len()
        );
    }

    let report = json!({
        "todos": service.list_todos(&TodoListQuery::default())?,
        "stats": service.stats()?,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}
