//! List command implementation
//!
//! Runs discovery and validation only; the database is never opened.

use anyhow::{Context, Result};
use serde::Serialize;
use sw_core::split_batches;
use sw_engine::load_migrations;

use crate::cli::{GlobalArgs, ListArgs, OutputFormat};
use crate::commands::common::load_project;

/// Execute the list command
pub(crate) fn execute(args: &ListArgs, global: &GlobalArgs) -> Result<()> {
    let migrations = collect(global)?;
    match args.output {
        OutputFormat::Table => print_table(&migrations),
        OutputFormat::Json => print_json(&migrations)?,
    }
    Ok(())
}

/// Migration information for display
#[derive(Debug, Serialize)]
pub(crate) struct MigrationInfo {
    pub(crate) id: String,
    pub(crate) sequence_number: u32,
    pub(crate) branch: String,
    pub(crate) hints: Vec<String>,
    pub(crate) batches: usize,
    pub(crate) description: String,
    pub(crate) origin: String,
}

pub(crate) fn collect(global: &GlobalArgs) -> Result<Vec<MigrationInfo>> {
    let project = load_project(global)?;
    let separator = &project.config.batch_separator;
    let migrations = load_migrations(&project.source(), separator)
        .context("Failed to load migrations")?;

    Ok(migrations
        .iter()
        .map(|m| MigrationInfo {
            id: m.id().to_string(),
            sequence_number: m.sequence_number(),
            branch: m.branch().to_string(),
            hints: m.hints().iter().map(String::from).collect(),
            batches: split_batches(m.sql(), separator).len(),
            description: m.description().to_string(),
            origin: m.origin().to_string(),
        })
        .collect())
}

/// First line of a possibly multi-line description
pub(crate) fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn print_table(migrations: &[MigrationInfo]) {
    let id_width = migrations
        .iter()
        .map(|m| m.id.len())
        .max()
        .unwrap_or(2)
        .max(2);
    let hints_width = migrations
        .iter()
        .map(|m| m.hints.join(",").len())
        .max()
        .unwrap_or(5)
        .max(5);

    println!(
        "{:<id_width$}  {:>7}  {:<hints_width$}  DESCRIPTION",
        "ID", "BATCHES", "HINTS"
    );
    println!(
        "{:-<id_width$}  {:-<7}  {:-<hints_width$}  {}",
        "",
        "",
        "",
        "-".repeat(40)
    );

    for m in migrations {
        let hints = if m.hints.is_empty() {
            "-".to_string()
        } else {
            m.hints.join(",")
        };
        println!(
            "{:<id_width$}  {:>7}  {:<hints_width$}  {}",
            m.id,
            m.batches,
            hints,
            first_line(&m.description)
        );
    }

    println!();
    println!("{} migrations", migrations.len());
}

fn print_json(migrations: &[MigrationInfo]) -> Result<()> {
    let json =
        serde_json::to_string_pretty(migrations).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "list_test.rs"]
mod tests;
