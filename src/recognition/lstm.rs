//! Stacked LSTM sign model running on candle.
//!
//! Weights are read from a safetensors file with the tensor names
//! `lstm{i}.weight_ih_l0`, `lstm{i}.weight_hh_l0`, `lstm{i}.bias_ih_l0`,
//! `lstm{i}.bias_hh_l0` per recurrent layer, `dense{i}.weight` /
//! `dense{i}.bias` per hidden dense layer (ReLU) and `output.weight` /
//! `output.bias` for the softmax head. Batch normalisation from training must
//! be folded into the following dense layer before export.

use crate::defaults;
use crate::error::{Result, SignStreamError};
use crate::landmarks::features::FeatureVector;
use crate::recognition::classifier::SignModel;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{LSTM, LSTMConfig, Linear, RNN, VarBuilder};
use std::path::Path;

/// Architecture of the exported network.
#[derive(Debug, Clone, PartialEq)]
pub struct LstmArchitecture {
    /// Hidden size of each recurrent layer, input side first.
    pub lstm_layers: Vec<usize>,
    /// Width of each hidden dense layer.
    pub dense_layers: Vec<usize>,
    pub num_classes: usize,
    pub window: usize,
}

impl Default for LstmArchitecture {
    fn default() -> Self {
        Self {
            lstm_layers: vec![128, 64],
            dense_layers: vec![64],
            num_classes: 0,
            window: defaults::WINDOW_LEN,
        }
    }
}

fn load_err(e: candle_core::Error) -> SignStreamError {
    SignStreamError::ModelLoad {
        message: e.to_string(),
    }
}

fn infer_err(e: candle_core::Error) -> SignStreamError {
    SignStreamError::Inference {
        message: e.to_string(),
    }
}

/// LSTM classifier loaded from safetensors.
pub struct LstmSignModel {
    name: String,
    window: usize,
    lstms: Vec<LSTM>,
    dense: Vec<Linear>,
    output: Linear,
    device: Device,
}

impl LstmSignModel {
    /// Load weights for `arch` from a safetensors file on the CPU.
    pub fn load(path: &Path, arch: &LstmArchitecture) -> Result<Self> {
        if !path.exists() {
            return Err(SignStreamError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        if arch.num_classes == 0 {
            return Err(SignStreamError::ModelLoad {
                message: "number of classes must be positive".to_string(),
            });
        }

        let device = Device::Cpu;
        // SAFETY: the weights file is opened read-only and not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, &device) }
            .map_err(load_err)?;

        let mut in_dim = defaults::FEATURE_LEN;
        let mut lstms = Vec::with_capacity(arch.lstm_layers.len());
        for (i, hidden) in arch.lstm_layers.iter().enumerate() {
            let layer = candle_nn::lstm(in_dim, *hidden, LSTMConfig::default(), vb.pp(format!("lstm{i}")))
                .map_err(load_err)?;
            lstms.push(layer);
            in_dim = *hidden;
        }

        let mut dense = Vec::with_capacity(arch.dense_layers.len());
        for (i, width) in arch.dense_layers.iter().enumerate() {
            dense.push(candle_nn::linear(in_dim, *width, vb.pp(format!("dense{i}"))).map_err(load_err)?);
            in_dim = *width;
        }

        let output = candle_nn::linear(in_dim, arch.num_classes, vb.pp("output")).map_err(load_err)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "lstm".to_string());

        Ok(Self {
            name,
            window: arch.window.max(1),
            lstms,
            dense,
            output,
            device,
        })
    }

    fn forward(&self, window: &[FeatureVector]) -> candle_core::Result<Vec<f32>> {
        let mut flat = Vec::with_capacity(window.len() * defaults::FEATURE_LEN);
        for row in window {
            flat.extend_from_slice(row.as_slice());
        }

        let mut xs = Tensor::from_vec(flat, (1, window.len(), defaults::FEATURE_LEN), &self.device)?;
        for lstm in &self.lstms {
            let states = lstm.seq(&xs)?;
            xs = lstm.states_to_tensor(&states)?;
        }

        // last time step only
        let mut xs = xs.narrow(1, window.len() - 1, 1)?.squeeze(1)?;
        for layer in &self.dense {
            xs = layer.forward(&xs)?.relu()?;
        }
        let logits = self.output.forward(&xs)?;

        candle_nn::ops::softmax_last_dim(&logits)?
            .squeeze(0)?
            .to_vec1::<f32>()
    }
}

impl SignModel for LstmSignModel {
    fn predict(&self, window: &[FeatureVector]) -> Result<Vec<f32>> {
        if window.len() != self.window {
            return Err(SignStreamError::ShapeMismatch {
                expected: format!("{}x{}", self.window, defaults::FEATURE_LEN),
                actual: format!("{}x{}", window.len(), defaults::FEATURE_LEN),
            });
        }
        self.forward(window).map_err(infer_err)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::window::SlidingWindowBuffer;
    use candle_nn::VarMap;
    use tempfile::TempDir;

    /// Writes freshly initialised weights for `arch` under the names `load` expects.
    fn write_weights(path: &Path, arch: &LstmArchitecture) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);

        let mut in_dim = defaults::FEATURE_LEN;
        for (i, hidden) in arch.lstm_layers.iter().enumerate() {
            candle_nn::lstm(in_dim, *hidden, LSTMConfig::default(), vb.pp(format!("lstm{i}"))).unwrap();
            in_dim = *hidden;
        }
        for (i, width) in arch.dense_layers.iter().enumerate() {
            candle_nn::linear(in_dim, *width, vb.pp(format!("dense{i}"))).unwrap();
            in_dim = *width;
        }
        candle_nn::linear(in_dim, arch.num_classes, vb.pp("output")).unwrap();

        varmap.save(path).unwrap();
    }

    #[test]
    fn lstm_model_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<LstmSignModel>();
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let arch = LstmArchitecture {
            num_classes: 3,
            ..Default::default()
        };
        let result = LstmSignModel::load(Path::new("/nonexistent/model.safetensors"), &arch);
        assert!(matches!(result, Err(SignStreamError::ModelNotFound { .. })));
    }

    #[test]
    fn predict_returns_class_distribution() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signs.safetensors");
        let arch = LstmArchitecture {
            num_classes: 3,
            ..Default::default()
        };
        write_weights(&path, &arch);

        let model = LstmSignModel::load(&path, &arch).unwrap();
        assert_eq!(model.model_name(), "signs");

        let window = SlidingWindowBuffer::with_width(arch.window).materialize();
        let probabilities = model.predict(&window).unwrap();

        assert_eq!(probabilities.len(), 3);
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        let total: f32 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-4, "probabilities sum to {total}");
    }

    #[test]
    fn predict_rejects_wrong_window_length() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signs.safetensors");
        let arch = LstmArchitecture {
            lstm_layers: vec![8],
            dense_layers: vec![],
            num_classes: 2,
            window: 4,
        };
        write_weights(&path, &arch);

        let model = LstmSignModel::load(&path, &arch).unwrap();
        let window = SlidingWindowBuffer::with_width(3).materialize();
        assert!(matches!(
            model.predict(&window),
            Err(SignStreamError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn default_architecture_mirrors_training_script() {
        let arch = LstmArchitecture::default();
        assert_eq!(arch.lstm_layers, vec![128, 64]);
        assert_eq!(arch.dense_layers, vec![64]);
    }
}
