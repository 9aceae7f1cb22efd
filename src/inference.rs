//! Inference Contract
//!
//! Maps validated feature vectors to a class and its probability table.
//! The `Predictor` is built once at startup and only read afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::artifacts::{self, ArtifactError, Metadata, MODEL_NAME};
use crate::error::{AppError, AppResult, ValidationError};
use crate::features::FeatureVector;
use crate::model::Classifier;

/// Result for one feature vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub class_id: usize,
    pub class_name: String,
    pub proba: BTreeMap<String, f64>,
}

/// Response body shape follows the request body shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Single(PredictionResult),
    Batch(Vec<PredictionResult>),
}

/// Health/status payload
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub status: &'static str,
    pub model: &'static str,
    pub accuracy: f64,
}

/// Loaded model plus its metadata
pub struct Predictor {
    model: Box<dyn Classifier>,
    metadata: Metadata,
}

impl Predictor {
    /// Pair a classifier with its metadata; class counts must agree.
    pub fn new(model: Box<dyn Classifier>, metadata: Metadata) -> Result<Self, ArtifactError> {
        metadata.validate()?;
        if model.n_classes() != metadata.target_names.len() {
            return Err(ArtifactError::Inconsistent(format!(
                "model has {} classes but metadata names {}",
                model.n_classes(),
                metadata.target_names.len()
            )));
        }
        Ok(Self { model, metadata })
    }

    /// Load both artifacts from disk
    pub fn load(model_path: &Path, metadata_path: &Path) -> Result<Self, ArtifactError> {
        let model = artifacts::load_model(model_path)?;
        let metadata = artifacts::load_metadata(metadata_path)?;
        Self::new(Box::new(model), metadata)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn status(&self) -> Status {
        Status {
            status: "ok",
            model: MODEL_NAME,
            accuracy: self.metadata.accuracy,
        }
    }

    /// Predict a single JSON item
    pub fn infer(&self, item: &Value) -> AppResult<PredictionResult> {
        let x = FeatureVector::from_json(item)?;
        self.predict(&x)
    }

    pub fn predict(&self, x: &FeatureVector) -> AppResult<PredictionResult> {
        let class_id = self.model.classify(x);
        let probabilities = self.model.class_probabilities(x);
        let names = &self.metadata.target_names;

        let class_name = names
            .get(class_id)
            .ok_or_else(|| AppError::Internal(format!("class id {} has no name", class_id)))?
            .clone();

        let proba = names.iter().cloned().zip(probabilities).collect();

        Ok(PredictionResult {
            class_id,
            class_name,
            proba,
        })
    }

    /// Object in, object out; array in, array out. One bad element fails
    /// the whole request.
    pub fn handle_predict_request(&self, body: &Value) -> AppResult<PredictionOutput> {
        match body {
            Value::Object(_) => self.infer(body).map(PredictionOutput::Single),
            Value::Array(items) => {
                tracing::debug!("Batch prediction for {} items", items.len());
                items
                    .iter()
                    .map(|item| self.infer(item))
                    .collect::<AppResult<Vec<_>>>()
                    .map(PredictionOutput::Batch)
            }
            _ => Err(ValidationError::BadShape.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::SoftmaxRegression;
    use serde_json::json;

    pub(crate) fn test_predictor() -> Predictor {
        let model = SoftmaxRegression::new(
            vec![
                vec![0.0, 0.0, -4.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 4.0, 0.0],
            ],
            vec![10.0, 0.0, -20.0],
        )
        .unwrap();
        let metadata = Metadata {
            target_names: vec!["setosa".into(), "versicolor".into(), "virginica".into()],
            accuracy: 0.97,
            model: None,
            feature_names: None,
            trained_at: None,
        };
        Predictor::new(Box::new(model), metadata).unwrap()
    }

    fn flower(petal_length: f64) -> Value {
        json!({
            "sepal_length": 5.1,
            "sepal_width": 3.5,
            "petal_length": petal_length,
            "petal_width": 0.2
        })
    }

    #[test]
    fn test_infer_names_class_and_fills_proba() {
        let predictor = test_predictor();
        let result = predictor.infer(&flower(1.4)).unwrap();

        assert_eq!(result.class_id, 0);
        assert_eq!(result.class_name, "setosa");
        assert_eq!(result.proba.len(), 3);
        assert!((result.proba.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(result.proba["setosa"] > result.proba["versicolor"]);
    }

    #[test]
    fn test_infer_is_deterministic() {
        let predictor = test_predictor();
        assert_eq!(
            predictor.infer(&flower(4.2)).unwrap(),
            predictor.infer(&flower(4.2)).unwrap()
        );
    }

    #[test]
    fn test_batch_preserves_order() {
        let predictor = test_predictor();
        let body = json!([flower(6.0), flower(1.4), flower(4.0)]);

        let PredictionOutput::Batch(results) = predictor.handle_predict_request(&body).unwrap() else {
            panic!("expected batch output");
        };
        let ids: Vec<usize> = results.iter().map(|r| r.class_id).collect();
        assert_eq!(ids, vec![2, 0, 1]);
    }

    #[test]
    fn test_huge_feature_value_still_sums_to_one() {
        let predictor = test_predictor();
        let result = predictor.infer(&flower(1e308)).unwrap();

        assert_eq!(result.class_id, 2);
        assert_eq!(result.class_name, "virginica");
        assert!((result.proba.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(result.proba.values().all(|p| p.is_finite()));
    }

    #[test]
    fn test_empty_batch() {
        let predictor = test_predictor();
        assert_eq!(
            predictor.handle_predict_request(&json!([])).unwrap(),
            PredictionOutput::Batch(vec![])
        );
    }

    #[test]
    fn test_batch_fails_on_first_bad_element() {
        let predictor = test_predictor();
        let body = json!([flower(1.4), {"sepal_length": 5.0}, {"petal_width": "x"}]);

        let err = predictor.handle_predict_request(&body).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::MissingFeature("sepal_width"))
        ));
    }

    #[test]
    fn test_scalar_body_is_bad_shape() {
        let predictor = test_predictor();
        for body in [json!(1), json!("text"), json!(null), json!(true)] {
            let err = predictor.handle_predict_request(&body).unwrap_err();
            assert!(matches!(err, AppError::Validation(ValidationError::BadShape)));
        }
    }

    #[test]
    fn test_class_count_must_match_names() {
        let model = SoftmaxRegression::new(vec![vec![0.0; 4]; 2], vec![0.0; 2]).unwrap();
        let metadata = test_predictor().metadata().clone();
        assert!(Predictor::new(Box::new(model), metadata).is_err());
    }

    #[test]
    fn test_status_reports_accuracy() {
        let status = test_predictor().status();
        assert_eq!(status.status, "ok");
        assert_eq!(status.model, "iris_clf");
        assert_eq!(status.accuracy, 0.97);
    }
}
