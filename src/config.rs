//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "$";

/// Configuration for a [`Vars`](crate::Vars) store.
///
/// Every field has a default, so an empty document deserializes into the
/// default configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarsConfig {
    /// Prefix that marks a string as a variable reference, e.g. `$id1`.
    /// Empty means [`DEFAULT_PREFIX`].
    pub prefix: String,
}

impl VarsConfig {
    /// Create a configuration with the given prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Check the configuration for values the store cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.chars().any(char::is_whitespace) {
            return Err(Error::Config {
                message: format!("prefix {:?} must not contain whitespace", self.prefix),
            });
        }
        Ok(())
    }

    /// The prefix in effect, falling back to [`DEFAULT_PREFIX`].
    pub fn effective_prefix(&self) -> &str {
        effective_prefix(&self.prefix)
    }
}

pub(crate) fn effective_prefix(prefix: &str) -> &str {
    if prefix.is_empty() {
        DEFAULT_PREFIX
    } else {
        prefix
    }
}
