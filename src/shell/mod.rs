//! External command execution.
//!
//! - [`command`] - Bounded process execution and the [`CommandRunner`] capability
//! - [`platform`] - Locations of the Windows system tools the probes invoke

pub mod command;
pub mod platform;

pub use command::{execute_bounded, CommandResult, CommandRunner, SystemRunner};
pub use platform::{is_ci, SystemTools};
