pub mod commands;
pub mod repl;

pub use commands::CliCommand;
pub use repl::{Outcome, Repl};
