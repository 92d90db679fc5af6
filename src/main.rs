use std::process::ExitCode;

use clap::Parser;
use savepenses::{
    cli,
    config::{CliArgs, Config, LoggingConfig},
    SCRIPT_NAME,
};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli_args = CliArgs::parse();
    let config = Config::load(&cli_args);
    init_logging(&config.logging);

    let today = time::OffsetDateTime::now_utc().date();
    let mut stdout = std::io::stdout().lock();

    match cli::execute(&cli_args, &config, today, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", SCRIPT_NAME, e);
            ExitCode::FAILURE
        }
    }
}
