//! Generic utility primitives with zero domain knowledge.
//!
//! - `command` - Process execution with error handling
//! - `io` - File I/O with consistent error handling
//! - `shell` - Shell quoting for display
//! - `sql` - SQL identifier and literal quoting
//! - `validation` - Input validation helpers

pub mod command;
pub mod io;
pub mod shell;
pub mod sql;
pub mod validation;
