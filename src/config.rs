use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "savepenses", version, about = "A CLI program for NickvisionMoney ledgers")]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["new", "update", "delete", "list", "balance"])
))]
pub struct CliArgs {
    /// Account file to use (falls back to `ledger.file` in the config file)
    #[arg(short, long, value_name = "/path/to/file")]
    pub file: Option<PathBuf>,

    /// Work on transactions (default)
    #[arg(short, long, conflicts_with = "group")]
    pub transaction: bool,

    /// Work on groups
    #[arg(short, long)]
    pub group: bool,

    /// New transaction/group
    #[arg(short, long)]
    pub new: bool,

    /// Update transaction/group selected with --id
    #[arg(short, long)]
    pub update: bool,

    /// Delete transaction/group by id
    #[arg(long, value_name = "ID")]
    pub delete: Option<i64>,

    /// List all transactions/groups
    #[arg(short, long)]
    pub list: bool,

    /// Show current balance
    #[arg(short, long)]
    pub balance: bool,

    /// Id of the record to update, or of the group to show a balance for
    #[arg(long, value_name = "ID")]
    pub id: Option<i64>,

    /// Income transaction
    #[arg(short, long, conflicts_with = "expense")]
    pub income: bool,

    /// Expense transaction
    #[arg(short, long)]
    pub expense: bool,

    /// Amount
    #[arg(short, long, value_name = "AMOUNT")]
    pub amount: Option<String>,

    /// Description of the transaction/group
    #[arg(short, long, value_name = "DESCRIPTION")]
    pub comment: Option<String>,

    /// Use this date instead of today
    #[arg(short, long, value_name = "1970-01-01")]
    pub date: Option<String>,

    /// Repeat tag: never, daily, weekly, monthly, quarterly, yearly, biyearly
    #[arg(short, long, value_name = "REPEAT")]
    pub repeat: Option<String>,

    /// Group the transaction belongs to
    #[arg(long = "group-id", value_name = "ID")]
    pub group_id: Option<i64>,

    /// Group name
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Print listings as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to config file
    #[arg(long, default_value = "savepenses.toml")]
    pub config: PathBuf,

    /// Log level (overrides config file)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LedgerConfig {
    /// Ledger used when --file is not given.
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        // CLI overrides
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }
        if let Some(ref file) = cli.file {
            config.ledger.file = Some(file.clone());
        }

        config
    }
}
