//! Tool server entry point.
//!
//! # Responsibility
//! - Resolve configuration and start logging before touching storage.
//! - Serve tool calls over stdin/stdout until end of input.
//!
//! # Invariants
//! - Stdout carries protocol replies only; diagnostics go to logs.

use log::error;
use notebase_cli::config::AppConfig;
use notebase_cli::server::serve;
use notebase_core::{init_logging, init_stderr_logging, NoteStore};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = AppConfig::from_env();

    let logging = match config.log_dir.as_deref() {
        Some(dir) => init_logging(&config.log_level, dir),
        None => init_stderr_logging(&config.log_level),
    };
    if let Err(err) = logging {
        eprintln!("notebase: logging disabled: {err}");
    }

    let store = match NoteStore::open(&config.db_path) {
        Ok(store) => store,
        Err(err) => {
            error!("event=db_open module=cli status=error error={err}");
            eprintln!("notebase: failed to open `{}`: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    match serve(&store, stdin.lock(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_loop module=cli status=error error={err}");
            ExitCode::FAILURE
        }
    }
}
