//! Legal Intel API server

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use legal_intel_api::config::{Args, Config};
use legal_intel_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::from_default_env()
            .add_directive("legal_intel_api=debug".parse()?)
            .add_directive("risk_engine=debug".parse()?)
            .add_directive("doc_extract=debug".parse()?)
    } else {
        EnvFilter::from_default_env().add_directive("legal_intel_api=info".parse()?)
    };

    tracing_subscriber::registry()
        .with(filter.add_directive("tower_http=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_args(&args)?;

    info!("Initializing Legal Intel API...");
    let state = AppState::new(
        config,
        args.database_url.as_deref(),
        args.rules.as_deref(),
    )
    .await?;
    let state = Arc::new(state);

    let app = legal_intel_api::build_router(state.clone());

    let addr = args.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!(
        "Upload limit: {} bytes, token lifetime: {} minutes",
        state.config.max_file_size, state.config.token_ttl_minutes
    );

    axum::serve(listener, app).await?;

    Ok(())
}
