//! Scriptable driver for a simulated Chord ring.
//!
//! Parses a small newline-delimited command script and dispatches each line
//! against a [`corelib::Ring`]. Not the original simulation's interactive
//! blank-line-returns-to-menu REPL, but a non-interactive front end reading
//! its command sequence from a file or stdin, suited to scripted demos and
//! integration tests.

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
