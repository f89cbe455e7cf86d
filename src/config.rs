//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive runtime
//! behavior, plus helpers to load configuration from disk and to persist
//! changed settings back (music root, UI toggles, volume).

mod load;
mod schema;

pub use load::{config_dir, resolve_config_path};
pub use schema::*;

#[cfg(test)]
mod tests;
