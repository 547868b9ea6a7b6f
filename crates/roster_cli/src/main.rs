//! CLI entry point over the roster core.
//!
//! # Responsibility
//! - Drive the store and synchronizer from a shell for local checks.
//! - Keep output deterministic and line-oriented.
//!
//! Database location and endpoint come from `ROSTER_DB_PATH` and
//! `ROSTER_TODO_URL`.

use roster_core::{HttpFetcher, Store, StoreConfig, Synchronizer};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

const USAGE: &str = "usage: roster_cli <ping|sync|todos|clear|groups>";

fn main() -> ExitCode {
    let Some(command) = std::env::args().nth(1) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    match run(command.as_str()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("roster_cli {command} failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: &str) -> Result<(), Box<dyn Error>> {
    match command {
        "ping" => {
            println!("roster_core ping={}", roster_core::ping());
            println!("roster_core version={}", roster_core::core_version());
        }
        "sync" => {
            let config = StoreConfig::from_env();
            let store = Arc::new(Store::open_with_config(&config)?);
            let synchronizer =
                Synchronizer::new(store, Arc::new(HttpFetcher::new()), config.todo_url.as_str());
            let report = synchronizer.sync_todos_blocking()?;
            println!(
                "received={} inserted={} skipped={}",
                report.received, report.inserted, report.skipped
            );
        }
        "todos" => {
            let store = open_store()?;
            for todo in store.fetch_todos().wait()? {
                let status = if todo.completed { "x" } else { " " };
                println!("[{status}] {}", todo.cell_title());
            }
        }
        "clear" => {
            let removed = open_store()?.remove_all_todos().wait()?;
            println!("removed={removed}");
        }
        "groups" => {
            for group in open_store()?.fetch_groups()? {
                println!("{} ({} people)", group.name, group.people.len());
                for person in &group.people {
                    println!(
                        "  {} | {}",
                        person.name.as_deref().unwrap_or_default(),
                        person.address.as_deref().unwrap_or_default()
                    );
                }
            }
        }
        other => return Err(format!("unknown command `{other}`; {USAGE}").into()),
    }
    Ok(())
}

fn open_store() -> Result<Store, Box<dyn Error>> {
    Ok(Store::open_with_config(&StoreConfig::from_env())?)
}
