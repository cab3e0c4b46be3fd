//! CLI command handlers. Each command is in its own file.

mod get;
mod probe;

pub use get::{run_get, GetArgs};
pub use probe::run_probe;

#[cfg(test)]
pub(crate) use get::format_progress;
