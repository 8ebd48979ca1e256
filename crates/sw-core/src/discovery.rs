//! Migration discovery providers.
//!
//! A [`MigrationSource`] yields migrations lazily; the engine consumes the
//! sequence exactly once. [`FileTreeSource`] reads `.sql` files from a
//! directory tree, [`DeclaredMigrations`] serves a statically registered list.

use crate::error::{CoreError, CoreResult};
use crate::migration::{BranchName, Hints, Migration, MigrationOrigin};
use crate::parser::{parse_source, DEFAULT_COMMENT_MARKER};
use std::path::{Path, PathBuf};

/// Lazy producer of migrations.
pub trait MigrationSource {
    /// Yield every migration of this source. Errors are yielded in place.
    fn migrations(&self) -> Box<dyn Iterator<Item = CoreResult<Migration>> + '_>;

    /// Short human-readable description for logging
    fn describe(&self) -> String;
}

impl MigrationSource for Vec<Migration> {
    fn migrations(&self) -> Box<dyn Iterator<Item = CoreResult<Migration>> + '_> {
        Box::new(self.iter().cloned().map(Ok))
    }

    fn describe(&self) -> String {
        format!("{} in-process migrations", self.len())
    }
}

/// Discovers one migration per `.sql` file below a root directory.
///
/// The file stem starts with the sequence number (`0003.sql`,
/// `0003-add-users.sql`). Files directly under the root belong to the
/// `master` branch; files in a subdirectory take the name of their parent
/// directory as branch.
#[derive(Debug, Clone)]
pub struct FileTreeSource {
    root: PathBuf,
    comment_marker: String,
}

impl FileTreeSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
        }
    }

    /// Override the line-comment marker used to find the description block
    pub fn with_comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_marker = marker.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All `.sql` files below the root, in sorted walk order.
    pub fn sql_files(&self) -> CoreResult<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(CoreError::MigrationsDirNotFound {
                path: self.root.display().to_string(),
            });
        }
        let mut files = Vec::new();
        collect_sql_files(&self.root, &mut files)?;
        Ok(files)
    }

    fn load_file(&self, path: &Path) -> CoreResult<Migration> {
        let source_name = path.display().to_string();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CoreError::MalformedName {
                source_name: source_name.clone(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        let sequence_number =
            parse_sequence_number(stem).map_err(|reason| CoreError::MalformedName {
                source_name: source_name.clone(),
                reason,
            })?;
        let branch = self.branch_for(path)?;

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: source_name,
            source: e,
        })?;
        let parsed = parse_source(&content, &self.comment_marker);
        log::debug!(
            "Discovered migration {}-{} in {}",
            sequence_number,
            branch,
            path.display()
        );

        Migration::new(
            sequence_number,
            branch,
            parsed.description,
            parsed.hints,
            parsed.sql,
            MigrationOrigin::File(path.to_path_buf()),
        )
    }

    fn branch_for(&self, path: &Path) -> CoreResult<BranchName> {
        let parent = match path.parent() {
            Some(parent) if parent != self.root => parent,
            _ => return Ok(BranchName::master()),
        };
        parent
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(BranchName::try_new)
            .ok_or_else(|| CoreError::MalformedName {
                source_name: path.display().to_string(),
                reason: "branch directory name is not valid UTF-8".to_string(),
            })
    }
}

impl MigrationSource for FileTreeSource {
    fn migrations(&self) -> Box<dyn Iterator<Item = CoreResult<Migration>> + '_> {
        match self.sql_files() {
            Ok(files) => Box::new(files.into_iter().map(move |path| self.load_file(&path))),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn describe(&self) -> String {
        format!("files in {}", self.root.display())
    }
}

/// Recursively collect `.sql` files, visiting directory entries in sorted order.
fn collect_sql_files(dir: &Path, files: &mut Vec<PathBuf>) -> CoreResult<()> {
    let io_err = |e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    };
    let mut entries = std::fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_sql_files(&path, files)?;
        } else if path.extension().is_some_and(|e| e == "sql") {
            files.push(path);
        }
    }
    Ok(())
}

/// Parse the leading sequence number of a migration file stem.
///
/// The digits may be followed by nothing, or by `-`/`_` and a free-text name.
pub fn parse_sequence_number(stem: &str) -> Result<u32, String> {
    let digits_end = stem
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(stem.len());
    if digits_end == 0 {
        return Err("file name must start with a sequence number".to_string());
    }
    let rest = &stem[digits_end..];
    if !(rest.is_empty() || rest.starts_with('-') || rest.starts_with('_')) {
        return Err(format!(
            "unexpected '{rest}' after the sequence number; separate the name with '-' or '_'"
        ));
    }
    stem[..digits_end]
        .parse::<u32>()
        .map_err(|e| format!("sequence number out of range: {e}"))
}

/// Statically registered migration descriptor.
///
/// Replaces comment parsing: metadata is supplied directly.
///
/// ```
/// use sw_core::discovery::{DeclaredMigration, DeclaredMigrations};
///
/// static MIGRATIONS: &[DeclaredMigration] = &[DeclaredMigration {
///     sequence_number: 1,
///     branch: None,
///     description: "Create users",
///     hints: &[],
///     sql: "CREATE TABLE users (id INTEGER)",
/// }];
///
/// let source = DeclaredMigrations::new(MIGRATIONS);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DeclaredMigration {
    pub sequence_number: u32,
    /// `None` means `master`
    pub branch: Option<&'static str>,
    pub description: &'static str,
    pub hints: &'static [&'static str],
    pub sql: &'static str,
}

impl DeclaredMigration {
    /// Convert into a normalized [`Migration`]
    pub fn to_migration(&self) -> CoreResult<Migration> {
        let branch = match self.branch {
            None => BranchName::master(),
            Some(name) => {
                BranchName::try_new(name).ok_or_else(|| CoreError::MalformedName {
                    source_name: format!("declared migration {}", self.sequence_number),
                    reason: "branch must not be empty".to_string(),
                })?
            }
        };
        let origin = MigrationOrigin::Declared(format!("{}-{}", self.sequence_number, branch));
        let hints: Hints = self.hints.iter().copied().collect();

        Migration::new(
            self.sequence_number,
            branch,
            self.description,
            hints,
            self.sql,
            origin,
        )
    }
}

/// Source backed by a static registry of [`DeclaredMigration`]s.
#[derive(Debug, Clone, Copy)]
pub struct DeclaredMigrations {
    registry: &'static [DeclaredMigration],
}

impl DeclaredMigrations {
    pub const fn new(registry: &'static [DeclaredMigration]) -> Self {
        Self { registry }
    }
}

impl MigrationSource for DeclaredMigrations {
    fn migrations(&self) -> Box<dyn Iterator<Item = CoreResult<Migration>> + '_> {
        Box::new(self.registry.iter().map(DeclaredMigration::to_migration))
    }

    fn describe(&self) -> String {
        format!("{} declared migrations", self.registry.len())
    }
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
