//! Error types for typed variable access and configuration.

use thiserror::Error;

/// Errors reported by the typed helpers and by configuration loading.
///
/// The core store operations (`get`, `set`, `fork`, ...) never fail; only the
/// paths that convert between Rust types and [`Value`](crate::Value) or that
/// validate configuration return this error.
#[derive(Debug, Error)]
pub enum Error {
    /// A stored value could not be decoded into the requested type.
    #[error("variable {key:?} has an incompatible value: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A typed value could not be converted into a variable value.
    #[error("variable {key:?} could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration was rejected.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
