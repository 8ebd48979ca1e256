//! Migrate command implementation

use anyhow::Result;
use std::time::Duration;
use sw_engine::{EngineError, MigrationReport, Migrator};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::load_project;

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let report = run(args, global)?;
    print_report(&report);
    Ok(())
}

/// Apply pending migrations of the project and return the run report.
pub(crate) fn run(args: &MigrateArgs, global: &GlobalArgs) -> Result<MigrationReport> {
    let project = load_project(global)?;
    let backend = project.open_backend()?;

    let mut options = project.migrator_options();
    if let Some(secs) = args.timeout {
        anyhow::ensure!(secs > 0, "--timeout must be greater than 0");
        options.command_timeout = Duration::from_secs(secs);
    }

    let source = project.source();
    Migrator::new(&backend, options)
        .migrate(&source)
        .map_err(describe_failure)
}

fn describe_failure(err: EngineError) -> anyhow::Error {
    if err.is_retryable() {
        return anyhow::Error::new(err)
            .context("Migration run conflicted with a concurrent run, retry once it has finished");
    }
    match err.migration_id().cloned() {
        Some(id) => anyhow::Error::new(err).context(format!("Migration {id} failed")),
        None => anyhow::Error::new(err),
    }
}

fn print_report(report: &MigrationReport) {
    if report.is_up_to_date() {
        println!(
            "Database is up to date ({} migrations applied)",
            report.already_applied
        );
        return;
    }

    for id in &report.applied {
        println!("  Applied: {id}");
    }
    println!();
    println!(
        "Applied {} migration{} in {:.2}s, {} already applied",
        report.applied.len(),
        if report.applied.len() == 1 { "" } else { "s" },
        report.duration.as_secs_f64(),
        report.already_applied
    );
}

#[cfg(test)]
#[path = "migrate_test.rs"]
mod tests;
