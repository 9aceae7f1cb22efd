//! Iris classifier inference server

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iris_serve::{config::Config, create_router, inference::Predictor, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "iris_serve=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!("Iris classifier server starting...");

    // Artifacts are loaded once; a failure here aborts startup
    let model_path = config.model_path();
    let metadata_path = config.metadata_path();
    let predictor = Predictor::load(&model_path, &metadata_path).with_context(|| {
        format!(
            "failed to load artifacts ({}, {}); run the `train` binary first",
            model_path.display(),
            metadata_path.display()
        )
    })?;

    let metadata = predictor.metadata();
    tracing::info!(
        "Model loaded: classes={:?} accuracy={:.3}",
        metadata.target_names,
        metadata.accuracy
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;

    let app = create_router(AppState::new(predictor, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
