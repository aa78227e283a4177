//! # Shared Vars
//!
//! A concurrency-safe variable store threaded through request-scoped contexts.
//!
//! A value set at one point of a call chain can be observed by code running
//! later in the same chain or in a chain derived from it.
//!
//! ## Store
//!
//! - [`Vars`] - Thread-safe map of named [`Value`]s with change observers
//! - Forking into independent copies attached to a [`Context`]
//! - Prefix-based recognition and substitution of variable names
//!
//! ## Context
//!
//! - [`Context`] - Immutable execution context carrying a store
//! - [`attach_to_context`] / [`read_context_vars`] - Ambient variables for
//!   contexts that carry no store yet

pub mod config;
pub mod context;
pub mod error;
pub mod vars;

// Re-export main types for convenience
pub use config::{VarsConfig, DEFAULT_PREFIX};
pub use context::{attach_to_context, read_context_vars, Context};
pub use error::{Error, Result};
pub use serde_json::Value;
pub use vars::Vars;
