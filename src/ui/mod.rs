//! UI module - console front end
//!
//! This module contains the presentation layer:
//! - `commands` - Parses shell input into commands
//! - `session` - Session state and the operations commands dispatch to
//! - `drop` - Turns dropped URLs into local file paths
//! - `render` - Text output for the list, results and settings
//! - `shell` - The stdin read loop

pub mod commands;
pub mod drop;
pub mod render;
pub mod session;
pub mod shell;

pub use session::Session;
pub use shell::run_shell;
