//! Request-scoped execution contexts.
//!
//! A [`Context`] is an immutable value threaded explicitly through the host's
//! call graph. It can carry a [`Vars`](crate::Vars) store, and failing that an
//! ambient map of variables attached with [`attach_to_context`].

mod context;

pub use context::{attach_to_context, read_context_vars, Context};
