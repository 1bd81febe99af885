use clap::Parser;
use feedsync::{cli, services};
use std::process;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.filter())
        .format_target(false)
        .format_timestamp_secs()
        .init();

    if let Err(e) = services::run(args).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
