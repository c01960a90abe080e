//! Linear softmax classifier over a mean-pooled window.
//!
//! A light-weight [`SignModel`] described entirely by a JSON file:
//!
//! ```json
//! {
//!   "name": "signs-v1",
//!   "window": 30,
//!   "weights": [[...1662 values...], ...],   // one row per class
//!   "bias": [...],                           // one value per class
//!   "mean": [...], "std": [...]              // optional feature standardisation
//! }
//! ```

use crate::defaults;
use crate::error::{Result, SignStreamError};
use crate::landmarks::features::FeatureVector;
use crate::recognition::classifier::SignModel;
use serde::Deserialize;
use std::path::Path;

/// Smallest standard deviation used when standardising features.
const MIN_STD: f32 = 1e-8;

#[derive(Debug, Deserialize)]
struct LinearModelFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    window: Option<usize>,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    #[serde(default)]
    mean: Option<Vec<f32>>,
    #[serde(default)]
    std: Option<Vec<f32>>,
}

/// Per-feature standardisation statistics.
#[derive(Debug, Clone, PartialEq)]
struct Standardizer {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Standardizer {
    fn apply(&self, values: &mut [f32]) {
        for ((v, m), s) in values.iter_mut().zip(&self.mean).zip(&self.std) {
            *v = (*v - m) / s.max(MIN_STD);
        }
    }
}

/// Softmax classifier `softmax(W · standardize(mean(window)) + b)`.
#[derive(Debug, Clone)]
pub struct LinearSignModel {
    name: String,
    window: usize,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    standardizer: Option<Standardizer>,
}

impl LinearSignModel {
    /// Build a model from raw parameters.
    pub fn new(name: &str, window: usize, weights: Vec<Vec<f32>>, bias: Vec<f32>) -> Result<Self> {
        if weights.is_empty() {
            return Err(SignStreamError::ModelLoad {
                message: "model has no classes".to_string(),
            });
        }
        if bias.len() != weights.len() {
            return Err(SignStreamError::ModelLoad {
                message: format!("{} weight rows but {} bias values", weights.len(), bias.len()),
            });
        }
        if let Some((idx, row)) = weights
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != defaults::FEATURE_LEN)
        {
            return Err(SignStreamError::ModelLoad {
                message: format!(
                    "weight row {idx} has {} values, expected {}",
                    row.len(),
                    defaults::FEATURE_LEN
                ),
            });
        }

        Ok(Self {
            name: name.to_string(),
            window: window.max(1),
            weights,
            bias,
            standardizer: None,
        })
    }

    /// Standardise pooled features with the training-set statistics.
    pub fn with_standardization(mut self, mean: Vec<f32>, std: Vec<f32>) -> Result<Self> {
        if mean.len() != defaults::FEATURE_LEN || std.len() != defaults::FEATURE_LEN {
            return Err(SignStreamError::ModelLoad {
                message: format!(
                    "standardisation needs {} means and stds, got {} and {}",
                    defaults::FEATURE_LEN,
                    mean.len(),
                    std.len()
                ),
            });
        }
        self.standardizer = Some(Standardizer { mean, std });
        Ok(self)
    }

    /// Parse a model from its JSON description.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LinearModelFile =
            serde_json::from_str(json).map_err(|e| SignStreamError::ModelLoad {
                message: format!("invalid model JSON: {e}"),
            })?;

        let name = file.name.unwrap_or_else(|| "linear".to_string());
        let window = file.window.unwrap_or(defaults::WINDOW_LEN);
        let model = Self::new(&name, window, file.weights, file.bias)?;

        match (file.mean, file.std) {
            (Some(mean), Some(std)) => model.with_standardization(mean, std),
            (None, None) => Ok(model),
            _ => Err(SignStreamError::ModelLoad {
                message: "mean and std must be given together".to_string(),
            }),
        }
    }

    /// Load a model file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SignStreamError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Number of frames this model expects per window.
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn num_classes(&self) -> usize {
        self.weights.len()
    }

    fn pool(&self, window: &[FeatureVector]) -> Vec<f32> {
        let mut pooled = vec![0.0f32; defaults::FEATURE_LEN];
        for row in window {
            for (acc, v) in pooled.iter_mut().zip(row.as_slice()) {
                *acc += v;
            }
        }
        let n = window.len() as f32;
        pooled.iter_mut().for_each(|v| *v /= n);
        if let Some(ref standardizer) = self.standardizer {
            standardizer.apply(&mut pooled);
        }
        pooled
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl SignModel for LinearSignModel {
    fn predict(&self, window: &[FeatureVector]) -> Result<Vec<f32>> {
        if window.len() != self.window {
            return Err(SignStreamError::ShapeMismatch {
                expected: format!("{}x{}", self.window, defaults::FEATURE_LEN),
                actual: format!("{}x{}", window.len(), defaults::FEATURE_LEN),
            });
        }

        let pooled = self.pool(window);
        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(&pooled).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();

        Ok(softmax(&logits))
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
