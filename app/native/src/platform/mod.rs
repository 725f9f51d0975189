//! Platform helpers shared across modules.
//!
//! - [`path`] - Shell-like path expansion
//! - [`thread`] - Named background threads

pub mod path;
pub mod thread;
