//! Artifact Producer
//!
//! Fits a multinomial logistic regression on the Iris dataset with
//! `linfa-logistic`, measures held-out accuracy and writes the two
//! artifacts consumed by the server.

use std::path::{Path, PathBuf};

use chrono::Utc;
use linfa::prelude::*;
use linfa_logistic::{MultiFittedLogisticRegression, MultiLogisticRegression};
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use crate::artifacts::{self, ArtifactError, Metadata, MODEL_NAME};
use crate::config::{METADATA_FILE, MODEL_FILE};
use crate::features::{FEATURES, FEATURE_COUNT};
use crate::model::{ModelError, SoftmaxRegression};

/// Iris class labels, index = class id
pub const TARGET_NAMES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// Training hyper-parameters
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Seed for the train/test shuffle
    pub seed: u64,
    /// Share of samples used for fitting
    pub train_ratio: f32,
    pub max_iterations: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            train_ratio: 0.8,
            max_iterations: 200,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("logistic regression failed: {0}")]
    Fit(#[from] linfa_logistic::error::Error),

    #[error("fitted model is unusable: {0}")]
    Model(#[from] ModelError),

    #[error("class {0} has no label")]
    UnknownClass(usize),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// What a training run produced
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: SoftmaxRegression,
    pub metadata: Metadata,
}

/// Fit and evaluate; nothing is written.
pub fn train(config: &TrainConfig) -> Result<TrainOutcome, TrainError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (train, test) = linfa_datasets::iris()
        .shuffle(&mut rng)
        .split_with_ratio(config.train_ratio);

    tracing::info!(
        "Fitting on {} samples, evaluating on {}",
        train.nsamples(),
        test.nsamples()
    );

    let fitted = MultiLogisticRegression::default()
        .max_iterations(config.max_iterations)
        .fit(&train)?;

    let predicted = fitted.predict(&test);
    let accuracy = accuracy(&predicted.to_vec(), &test.targets().to_vec());

    let metadata = Metadata {
        target_names: TARGET_NAMES.iter().map(|s| s.to_string()).collect(),
        accuracy,
        model: Some(MODEL_NAME.to_string()),
        feature_names: Some(FEATURES.iter().map(|s| s.to_string()).collect()),
        trained_at: Some(Utc::now()),
    };

    Ok(TrainOutcome {
        model: export(&fitted)?,
        metadata,
    })
}

/// Share of matching labels, computed in f64
fn accuracy(predicted: &[usize], truth: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    correct as f64 / truth.len() as f64
}

/// Re-arrange linfa's parameters into one weight row per class id.
fn export(fitted: &MultiFittedLogisticRegression<f64, usize>) -> Result<SoftmaxRegression, TrainError> {
    let params = fitted.params();
    let intercept = fitted.intercept();

    let mut weights = vec![vec![0.0; FEATURE_COUNT]; TARGET_NAMES.len()];
    let mut biases = vec![0.0; TARGET_NAMES.len()];

    for (column, &class_id) in fitted.classes().iter().enumerate() {
        if class_id >= TARGET_NAMES.len() {
            return Err(TrainError::UnknownClass(class_id));
        }
        weights[class_id] = params.column(column).to_vec();
        biases[class_id] = intercept[column];
    }

    Ok(SoftmaxRegression::new(weights, biases)?)
}

/// Write model and metadata into `out_dir`, returning both paths.
pub fn save(outcome: &TrainOutcome, out_dir: &Path) -> Result<(PathBuf, PathBuf), TrainError> {
    let model_path = out_dir.join(MODEL_FILE);
    let metadata_path = out_dir.join(METADATA_FILE);

    artifacts::save_model(&model_path, &outcome.model)?;
    artifacts::save_metadata(&metadata_path, &outcome.metadata)?;

    Ok((model_path, metadata_path))
}
