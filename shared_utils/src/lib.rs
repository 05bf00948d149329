//! Small helpers shared by the workspace crates: environment lookups and the
//! configuration error type.

pub mod config;
pub mod env;
