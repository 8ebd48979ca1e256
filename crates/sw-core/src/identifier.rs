//! Non-empty string identifiers of the migration model.
//!
//! [`MigrationId`](crate::MigrationId) is the ledger key `"{seq}-{branch}"`
//! and [`BranchName`](crate::BranchName) the directory a migration was found
//! in. Both must compare, hash, sort and print as the plain string they wrap,
//! and neither may be empty.

/// Declare a non-empty string identifier.
///
/// The type serializes as its string, refuses an empty string when
/// deserialized (so a ledger or config value can never produce an empty
/// id), and compares equal to `str` / `String` so ids read back from the
/// ledger can be matched without wrapping them first.
macro_rules! string_identifier {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl $Name {
            /// `None` for an empty string.
            pub fn try_new(value: impl Into<String>) -> Option<Self> {
                let value = value.into();
                (!value.is_empty()).then_some(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                $Name::try_new(value).ok_or_else(|| {
                    serde::de::Error::custom(concat!("empty ", stringify!($Name)))
                })
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        // Lets maps keyed by id be looked up with a `&str`.
        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $Name {
            fn eq(&self, other: &String) -> bool {
                &self.0 == other
            }
        }
    };
}

pub(crate) use string_identifier;
