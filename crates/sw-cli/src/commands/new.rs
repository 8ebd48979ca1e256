//! New command implementation

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use sw_core::discovery::parse_sequence_number;
use sw_core::DEFAULT_BRANCH;

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common::load_project;

/// Execute the new command
pub(crate) fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let path = create(args, global)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Write the next-numbered migration file and return its path.
pub(crate) fn create(args: &NewArgs, global: &GlobalArgs) -> Result<PathBuf> {
    let project = load_project(global)?;
    let migrations_dir = project.migrations_dir();

    let slug = slugify(&args.name);
    if slug.is_empty() {
        bail!("Migration name '{}' has no usable characters", args.name);
    }

    let target_dir = match args.branch.as_deref().map(str::trim) {
        None | Some(DEFAULT_BRANCH) => migrations_dir.clone(),
        Some(branch) => {
            validate_branch(branch)?;
            migrations_dir.join(branch)
        }
    };
    fs::create_dir_all(&target_dir)
        .with_context(|| format!("Failed to create {}", target_dir.display()))?;

    let sequence_number = next_sequence_number(&migrations_dir)?;
    let path = target_dir.join(format!("{sequence_number:04}-{slug}.sql"));
    if path.exists() {
        bail!("Migration file already exists: {}", path.display());
    }

    fs::write(&path, template(&args.name))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Wrote migration template {}", path.display());
    Ok(path)
}

/// One past the highest sequence number anywhere below `dir`.
///
/// Files whose names carry no sequence number are skipped.
fn next_sequence_number(dir: &Path) -> Result<u32> {
    let files = sw_core::FileTreeSource::new(dir)
        .sql_files()
        .context("Failed to scan migrations directory")?;

    let highest = files
        .iter()
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()))
        .filter_map(|stem| parse_sequence_number(stem).ok())
        .max()
        .unwrap_or(0);
    highest
        .checked_add(1)
        .context("Sequence numbers exhausted")
}

fn validate_branch(branch: &str) -> Result<()> {
    let valid = !branch.is_empty()
        && branch
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !branch.starts_with('.');
    if !valid {
        bail!("Invalid branch name '{branch}': use letters, digits, '-', '_' or '.'");
    }
    Ok(())
}

/// Lowercase, ASCII alphanumerics separated by single dashes.
fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn template(name: &str) -> String {
    format!(
        "-- {}\n-- hints:\n\n-- Statements go here. A line containing only `go` starts a new batch.\n",
        name.trim()
    )
}

#[cfg(test)]
#[path = "new_test.rs"]
mod tests;
