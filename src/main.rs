use clap::Parser;
use organize::cli::{Cli, run_cli};
use organize::output::OutputFormatter;
use organize::signal::setup_shutdown_signal;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let shutdown_signal = setup_shutdown_signal();

    match run_cli(&cli, shutdown_signal) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
