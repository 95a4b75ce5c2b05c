mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Parse CLI, set up logging, and dispatch.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("tokgen error: {:#}", err);
        std::process::exit(1);
    }
}
