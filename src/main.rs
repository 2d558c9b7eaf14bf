use std::process::ExitCode;

use baseuri_uploader::{app, cli::Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match app::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "baseuri-uploader failed");
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
