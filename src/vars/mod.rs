//! The variable store.
//!
//! [`Vars`] keeps named values behind a single lock, notifies observers on
//! every write, and forks into independent copies attached to a
//! [`Context`](crate::Context).

mod vars;

pub use vars::Vars;
