pub mod cli;
pub mod config;
pub mod output;

/// Name used as the prefix of diagnostics.
pub const SCRIPT_NAME: &str = "savepenses";
