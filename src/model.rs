//! Classifier Model
//!
//! `Classifier` is the seam between the HTTP layer and whatever model backs
//! it. The shipped implementation is a multinomial logistic regression whose
//! weights are fitted offline by `linfa-logistic` and stored as JSON.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{FeatureVector, FEATURE_COUNT};

/// Read-only classifier shared by all requests
pub trait Classifier: Send + Sync {
    /// Number of classes; class ids are `0..n_classes()`
    fn n_classes(&self) -> usize;

    /// Probability of each class, indexed by class id
    fn class_probabilities(&self, x: &FeatureVector) -> Vec<f64>;

    /// Most probable class id
    fn classify(&self, x: &FeatureVector) -> usize {
        argmax(&self.class_probabilities(x))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("model has no classes")]
    Empty,

    #[error("expected {} weights per class, class {class} has {found}", FEATURE_COUNT)]
    FeatureMismatch { class: usize, found: usize },

    #[error("{weights} weight rows but {intercepts} intercepts")]
    InterceptMismatch { weights: usize, intercepts: usize },

    #[error("model contains non-finite parameters")]
    NonFinite,
}

/// On-disk form of [`SoftmaxRegression`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxParams {
    /// One row of feature weights per class id
    weights: Vec<Vec<f64>>,
    /// One bias per class id
    intercept: Vec<f64>,
}

/// Multinomial logistic regression: `softmax(W x + b)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SoftmaxParams", into = "SoftmaxParams")]
pub struct SoftmaxRegression {
    /// `n_classes x FEATURE_COUNT`
    weights: Array2<f64>,
    intercept: Array1<f64>,
}

impl SoftmaxRegression {
    /// Build from per-class weight rows and biases.
    pub fn new(weights: Vec<Vec<f64>>, intercept: Vec<f64>) -> Result<Self, ModelError> {
        Self::try_from(SoftmaxParams { weights, intercept })
    }

    /// Raw class scores before normalization
    fn decision_function(&self, x: ArrayView1<f64>) -> Array1<f64> {
        self.weights.dot(&x) + &self.intercept
    }
}

impl TryFrom<SoftmaxParams> for SoftmaxRegression {
    type Error = ModelError;

    fn try_from(params: SoftmaxParams) -> Result<Self, Self::Error> {
        let n_classes = params.weights.len();
        if n_classes == 0 {
            return Err(ModelError::Empty);
        }
        if params.intercept.len() != n_classes {
            return Err(ModelError::InterceptMismatch {
                weights: n_classes,
                intercepts: params.intercept.len(),
            });
        }
        if let Some((class, row)) = params
            .weights
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != FEATURE_COUNT)
        {
            return Err(ModelError::FeatureMismatch { class, found: row.len() });
        }

        let flat: Vec<f64> = params.weights.into_iter().flatten().collect();
        if flat.iter().chain(&params.intercept).any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite);
        }

        let weights = Array2::from_shape_vec((n_classes, FEATURE_COUNT), flat)
            .map_err(|_| ModelError::FeatureMismatch { class: 0, found: 0 })?;

        Ok(Self {
            weights,
            intercept: Array1::from(params.intercept),
        })
    }
}

impl From<SoftmaxRegression> for SoftmaxParams {
    fn from(model: SoftmaxRegression) -> Self {
        Self {
            weights: model.weights.outer_iter().map(|row| row.to_vec()).collect(),
            intercept: model.intercept.to_vec(),
        }
    }
}

impl Classifier for SoftmaxRegression {
    fn n_classes(&self) -> usize {
        self.intercept.len()
    }

    fn class_probabilities(&self, x: &FeatureVector) -> Vec<f64> {
        let input = ArrayView1::from(&x.as_array()[..]);
        softmax(self.decision_function(input).view())
    }
}

/// Numerically stable softmax.
///
/// Huge inputs can push scores to +-inf: +inf scores share all the mass,
/// -inf and NaN scores get none.
fn softmax(scores: ArrayView1<f64>) -> Vec<f64> {
    let n = scores.len();
    let max = scores.fold(f64::NEG_INFINITY, |acc, &s| acc.max(s));

    if max == f64::INFINITY {
        let winners = scores.iter().filter(|&&s| s == f64::INFINITY).count() as f64;
        return scores
            .iter()
            .map(|&s| if s == f64::INFINITY { 1.0 / winners } else { 0.0 })
            .collect();
    }
    if !max.is_finite() {
        return vec![1.0 / n as f64; n];
    }

    let exp: Vec<f64> = scores
        .iter()
        .map(|&s| if s.is_nan() { 0.0 } else { (s - max).exp() })
        .collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; ties go to the lowest index.
fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_val), (i, &v)| {
            if v > best_val { (i, v) } else { (best, best_val) }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three classes split on petal length only
    fn petal_model() -> SoftmaxRegression {
        SoftmaxRegression::new(
            vec![
                vec![0.0, 0.0, -4.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 4.0, 0.0],
            ],
            vec![10.0, 0.0, -20.0],
        )
        .unwrap()
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = petal_model();
        for petal_length in [0.5, 1.4, 2.5, 4.0, 6.9] {
            let x = FeatureVector::from_values([5.0, 3.0, petal_length, 1.0]);
            let proba = model.class_probabilities(&x);
            assert_eq!(proba.len(), 3);
            assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_classify_matches_argmax() {
        let model = petal_model();
        assert_eq!(model.classify(&FeatureVector::from_values([5.1, 3.5, 1.4, 0.2])), 0);
        assert_eq!(model.classify(&FeatureVector::from_values([6.0, 2.9, 4.0, 1.3])), 1);
        assert_eq!(model.classify(&FeatureVector::from_values([6.3, 3.3, 6.0, 2.5])), 2);
    }

    #[test]
    fn test_softmax_is_stable_for_large_scores() {
        let proba = softmax(Array1::from(vec![1000.0, 1000.0]).view());
        assert_eq!(proba, vec![0.5, 0.5]);
    }

    #[test]
    fn test_overflowing_scores_keep_a_distribution() {
        let model = petal_model();
        let x = FeatureVector::from_values([5.1, 3.5, 1e308, 0.2]);
        assert_eq!(model.class_probabilities(&x), vec![0.0, 0.0, 1.0]);
        assert_eq!(model.classify(&x), 2);

        let proba = softmax(Array1::from(vec![f64::INFINITY, 0.0, f64::INFINITY]).view());
        assert_eq!(proba, vec![0.5, 0.0, 0.5]);

        let proba = softmax(Array1::from(vec![f64::NAN, 1.0, f64::NEG_INFINITY]).view());
        assert_eq!(proba, vec![0.0, 1.0, 0.0]);

        let proba = softmax(Array1::from(vec![f64::NAN, f64::NEG_INFINITY]).view());
        assert_eq!(proba, vec![0.5, 0.5]);
    }

    #[test]
    fn test_rejects_malformed_parameters() {
        assert_eq!(SoftmaxRegression::new(vec![], vec![]), Err(ModelError::Empty));
        assert_eq!(
            SoftmaxRegression::new(vec![vec![0.0; 4]], vec![0.0, 1.0]),
            Err(ModelError::InterceptMismatch { weights: 1, intercepts: 2 })
        );
        assert_eq!(
            SoftmaxRegression::new(vec![vec![0.0; 4], vec![0.0; 3]], vec![0.0, 0.0]),
            Err(ModelError::FeatureMismatch { class: 1, found: 3 })
        );
        assert_eq!(
            SoftmaxRegression::new(vec![vec![f64::NAN, 0.0, 0.0, 0.0]], vec![0.0]),
            Err(ModelError::NonFinite)
        );
    }

    #[test]
    fn test_json_form_round_trips() {
        let model = petal_model();
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["intercept"], serde_json::json!([10.0, 0.0, -20.0]));
        let back: SoftmaxRegression = serde_json::from_value(json).unwrap();
        assert_eq!(back, model);
    }
}
