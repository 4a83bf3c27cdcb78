use clap::Parser;
use launchpad_cli::{Cli, exit_code_for, run};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    launchpad_telemetry::init_telemetry("launchpad", &cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(u8::try_from(exit_code_for(&e)).unwrap_or(1))
        }
    }
}
