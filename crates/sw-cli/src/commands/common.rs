//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::path::PathBuf;
use sw_core::config::CONFIG_FILE_NAMES;
use sw_core::{Actor, Config, DbType, FileTreeSource};
use sw_db::DuckDbBackend;
use sw_engine::MigratorOptions;

use crate::cli::GlobalArgs;

/// Project directory with its resolved configuration.
#[derive(Debug)]
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    /// Absolute migrations directory
    pub(crate) fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_dir_absolute(&self.root)
    }

    /// File-tree discovery over the migrations directory
    pub(crate) fn source(&self) -> FileTreeSource {
        FileTreeSource::new(self.migrations_dir())
            .with_comment_marker(self.config.comment_marker.clone())
    }

    /// Open the configured database
    pub(crate) fn open_backend(&self) -> Result<DuckDbBackend> {
        let path = self.config.database_path_absolute(&self.root);
        match self.config.database.db_type {
            DbType::DuckDb => {
                log::debug!("Opening DuckDB database at {path}");
                DuckDbBackend::new(&path)
                    .with_context(|| format!("Failed to open database: {path}"))
            }
        }
    }

    /// Engine options for this project, applied as the current user
    pub(crate) fn migrator_options(&self) -> MigratorOptions {
        MigratorOptions::from_config(&self.config, Actor::from_env())
    }
}

/// Load the project from the directory specified in global CLI arguments.
///
/// An explicit `--config` must exist. Without one, `stepwise.yml` /
/// `stepwise.yaml` in the project directory is used when present and
/// defaults apply otherwise.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = global.project_dir.clone();
    let mut config = match &global.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None if CONFIG_FILE_NAMES.iter().any(|n| root.join(n).is_file()) => {
            Config::load_from_dir(&root).context("Failed to load project config")?
        }
        None => {
            log::debug!(
                "No config file in {}, using defaults",
                root.display()
            );
            Config::default()
        }
    };

    if let Some(database) = &global.database {
        config.database.path = database.clone();
    }

    Ok(Project { root, config })
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
