use anyhow::Result;
use clap::Parser;
use palsy_detect::cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so `.env` values reach clap's `env` fallbacks
    dotenv::dotenv().ok();

    // Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute the command
    match execute(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
