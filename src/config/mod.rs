//! Checker configuration.
//!
//! - [`schema`] - Configuration types and defaults
//! - [`loader`] - File, environment and validation layers

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_file, load_with_env, validate};
pub use schema::{AgentConfig, CheckerConfig};
