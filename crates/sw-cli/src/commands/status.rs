//! Status command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use sw_engine::{MigrationStatus, Migrator};

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::load_project;
use crate::commands::list::first_line;

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let rows = collect(args, global)?;
    match args.output {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => print_json(&rows)?,
    }
    Ok(())
}

/// Ledger state of one migration for display
#[derive(Debug, Serialize)]
pub(crate) struct StatusRow {
    pub(crate) id: String,
    pub(crate) state: MigrationState,
    pub(crate) no_transaction: bool,
    pub(crate) description: String,
    pub(crate) origin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MigrationState {
    Applied,
    Pending,
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationState::Applied => write!(f, "applied"),
            MigrationState::Pending => write!(f, "pending"),
        }
    }
}

impl From<MigrationStatus> for StatusRow {
    fn from(status: MigrationStatus) -> Self {
        Self {
            id: status.id.into_inner(),
            state: if status.applied {
                MigrationState::Applied
            } else {
                MigrationState::Pending
            },
            no_transaction: status.no_transaction,
            description: status.description,
            origin: status.origin,
        }
    }
}

pub(crate) fn collect(args: &StatusArgs, global: &GlobalArgs) -> Result<Vec<StatusRow>> {
    let project = load_project(global)?;
    let backend = project.open_backend()?;
    let statuses = Migrator::new(&backend, project.migrator_options())
        .status(&project.source())
        .context("Failed to read migration status")?;

    Ok(statuses
        .into_iter()
        .map(StatusRow::from)
        .filter(|row| !args.pending || row.state == MigrationState::Pending)
        .collect())
}

fn print_table(rows: &[StatusRow]) {
    let id_width = rows.iter().map(|r| r.id.len()).max().unwrap_or(2).max(2);
    let state_width = 7;

    println!(
        "{:<id_width$}  {:<state_width$}  DESCRIPTION",
        "ID", "STATE"
    );
    println!(
        "{:-<id_width$}  {:-<state_width$}  {}",
        "",
        "",
        "-".repeat(40)
    );
    for row in rows {
        let mut description = first_line(&row.description).to_string();
        if row.no_transaction {
            description.push_str(" [no-transaction]");
        }
        println!(
            "{:<id_width$}  {:<state_width$}  {}",
            row.id,
            row.state.to_string(),
            description.trim()
        );
    }

    let pending = rows
        .iter()
        .filter(|r| r.state == MigrationState::Pending)
        .count();
    println!();
    println!(
        "{} migrations: {} applied, {} pending",
        rows.len(),
        rows.len() - pending,
        pending
    );
}

fn print_json(rows: &[StatusRow]) -> Result<()> {
    let json = serde_json::to_string_pretty(rows).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
