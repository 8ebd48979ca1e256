//! Validated ledger table identifier.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Default name of the table recording applied migrations.
pub const DEFAULT_LEDGER_TABLE: &str = "__stepwise_ledger";

/// Name of the ledger table.
///
/// Identifiers cannot be bound as query parameters, so the name is restricted
/// to ASCII letters, digits and `_`, and must not start with a digit. Backends
/// may then quote it without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LedgerTable(String);

impl LedgerTable {
    /// Validate and wrap a table name
    pub fn new(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        let invalid = |reason: &str| CoreError::InvalidLedgerTable {
            name: name.clone(),
            reason: reason.to_string(),
        };

        let first = name.chars().next().ok_or_else(|| invalid("name is empty"))?;
        if first.is_ascii_digit() {
            return Err(invalid("name must not start with a digit"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("only ASCII letters, digits and '_' are allowed"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LedgerTable {
    fn default() -> Self {
        Self(DEFAULT_LEDGER_TABLE.to_string())
    }
}

impl fmt::Display for LedgerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for LedgerTable {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LedgerTable {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LedgerTable> for String {
    fn from(table: LedgerTable) -> Self {
        table.0
    }
}
