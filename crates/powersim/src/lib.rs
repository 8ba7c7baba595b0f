//! Command-line front end for `powersim_core`
//!
//! Resolves a study from flags, an optional YAML study file and engine
//! defaults, runs one of the `estimate`, `search` or `sweep` commands, and
//! renders the result as a text table or JSON.

pub mod cli;
pub mod commands;
mod logging;
pub mod report;
pub mod study;
pub mod util;

#[cfg(test)]
mod tests;

pub use cli::{Args, Command, CommonArgs, Format, TestArg};
pub use commands::{execute, run};
pub use logging::init_logging;
pub use report::Report;
pub use study::StudyConfig;
