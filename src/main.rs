//! Entry point: parse CLI and dispatch to command handlers.

use clap::Parser;
use olympics_api::{
    cli::{Commands, OlympicsCli},
    commands::{handle_import, handle_serve},
    config::AppConfig,
    logging::init_logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = OlympicsCli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Serve(args) => handle_serve(AppConfig::from(args)).await?,

        Commands::Import { data } => {
            let database = data.database_path();
            let summary = tokio::task::spawn_blocking(move || {
                handle_import(&database, &data.fixtures_dir)
            })
            .await??;
            println!(
                "Imported {} results, {} athletes, {} hosts, {} predictions",
                summary.results, summary.athletes, summary.hosts, summary.predictions
            );
        }
    }

    Ok(())
}
