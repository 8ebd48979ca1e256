//! Identity of whoever applies migrations, recorded in every ledger row.

use serde::{Deserialize, Serialize};

/// Placeholder for identity fields that cannot be resolved.
pub const UNKNOWN_IDENTITY: &str = "??";

/// User and host applying a run.
///
/// Resolved once per run and handed to the engine; nothing below the CLI
/// reads the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_name: String,
    pub user_domain: String,
    pub machine_name: String,
}

impl Actor {
    pub fn new(
        user_name: impl Into<String>,
        user_domain: impl Into<String>,
        machine_name: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            user_domain: user_domain.into(),
            machine_name: machine_name.into(),
        }
    }

    /// Resolve the identity from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the identity through `lookup`, falling back to `??`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_of = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(*key))
                .find(|value| !value.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
        };
        Self {
            user_name: first_of(&["USERNAME", "USER"]),
            user_domain: first_of(&["USERDOMAIN"]),
            machine_name: first_of(&["HOSTNAME", "COMPUTERNAME"]),
        }
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::new(UNKNOWN_IDENTITY, UNKNOWN_IDENTITY, UNKNOWN_IDENTITY)
    }
}
