//! Offline artifact producer: fits the Iris classifier and writes
//! `iris_clf.json` and `metadata.json`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iris_serve::training::{self, TrainConfig};

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train the Iris classifier and write its artifacts")]
struct Args {
    /// Output directory for the artifacts
    #[arg(long, env = "MODEL_DIR", default_value = "models")]
    out_dir: PathBuf,

    /// Seed for the train/test split
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "iris_serve=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = TrainConfig {
        seed: args.seed,
        ..TrainConfig::default()
    };

    let outcome = training::train(&config).context("training failed")?;
    let (model_path, metadata_path) = training::save(&outcome, &args.out_dir)
        .with_context(|| format!("failed to write artifacts to {}", args.out_dir.display()))?;

    tracing::info!("Model written to {}", model_path.display());
    tracing::info!("Metadata written to {}", metadata_path.display());
    println!("Model saved. Accuracy={:.3}", outcome.metadata.accuracy);

    Ok(())
}
