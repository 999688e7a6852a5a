use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use voyage::cli::{Cli, Commands};
use voyage::config;
use voyage::travel::{TripPlanner, TripRequest};
use voyage::web::session::SessionStore;
use voyage::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Provider keys usually live in .env
    let dotenv_path = dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    tracing::info!("Voyage starting");

    let config = config::load_config(&cli)?;
    tracing::info!(
        model = %config.model,
        output_dir = %config.output_dir.display(),
        search = ?config.search_provider,
        "Config loaded"
    );

    let planner = TripPlanner::from_config(&config);

    match cli.command {
        Commands::Serve { .. } => {
            let shutdown = CancellationToken::new();
            {
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Ctrl+C received, shutting down");
                        shutdown.cancel();
                    }
                });
            }

            let addr = format!("{}:{}", config.bind, config.port);
            let sessions = SessionStore::with_limits(config.session_ttl_secs, config.max_history);
            let state = AppState::new(planner).with_sessions(sessions);
            web::serve(&addr, state, shutdown).await?;
        }
        Commands::Plan {
            origin,
            destination,
            departure_date,
            return_date,
            interests,
            ..
        } => {
            let request = TripRequest {
                origin,
                destination,
                departure_date,
                return_date,
                interests,
            };

            let output = tokio::select! {
                result = planner.plan(request) => result.context("Trip planning failed")?,
                _ = tokio::signal::ctrl_c() => {
                    anyhow::bail!("Interrupted before the travel plan was finished");
                }
            };

            eprintln!(
                "✅ Travel plan created successfully! Reports written to {}",
                planner.output_dir().display()
            );
            println!("{output}");
        }
    }

    Ok(())
}
