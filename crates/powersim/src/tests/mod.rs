//! End-to-end tests driving the command line through `run`
//!
//! - `pipeline` - argument parsing, study files, rendering and report output
