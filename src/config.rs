use crate::defaults;
use crate::error::{Result, SignStreamError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub segmentation: SegmentationConfig,
    pub session: SessionSettings,
    pub assets: AssetsConfig,
    pub refine: RefineConfig,
    pub tts: TtsConfig,
}

/// HTTP/WebSocket listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Serve generated speech files under `/tts`
    pub serve_tts: bool,
}

/// Sign model configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub path: PathBuf,
    /// Label table: JSON object `{"0": "hello"}` or array
    pub labels: PathBuf,
    /// Frames per classification window
    pub window: usize,
}

/// Model backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// JSON softmax classifier over the mean-pooled window
    Linear,
    /// Stacked LSTM from safetensors (feature `lstm-model`)
    Lstm,
}

/// Sentence segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    pub pause_ms: u64,
}

/// Per-session pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub queue_capacity: usize,
    pub min_frame_interval_ms: u64,
}

/// Sign asset map configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetsConfig {
    pub mapping: PathBuf,
}

/// Sentence refinement configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefineConfig {
    pub provider: RefineProvider,
    pub model: String,
    pub timeout_secs: u64,
}

/// Refinement backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefineProvider {
    /// Keep the raw phrase
    None,
    /// Google Gemini; key from `GEMINI_API_KEY`
    Gemini,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TtsConfig {
    pub enabled: bool,
    pub program: String,
    /// Arguments with `{output}` and `{text}` placeholders; keep `{text}` after `--`
    pub args: Vec<String>,
    pub output_dir: PathBuf,
    pub extension: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: defaults::PORT,
            serve_tts: true,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Linear,
            path: PathBuf::from("model.json"),
            labels: PathBuf::from("mapping.json"),
            window: defaults::WINDOW_LEN,
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            pause_ms: defaults::PAUSE_THRESHOLD_MS,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            queue_capacity: defaults::QUEUE_CAPACITY,
            min_frame_interval_ms: defaults::MIN_FRAME_INTERVAL_MS,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            mapping: PathBuf::from("sign_mapping.json"),
        }
    }
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            provider: RefineProvider::None,
            model: defaults::REFINE_MODEL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "espeak-ng".to_string(),
            args: vec![
                "-w".to_string(),
                "{output}".to_string(),
                "--".to_string(),
                "{text}".to_string(),
            ],
            output_dir: PathBuf::from(defaults::TTS_DIR),
            extension: "wav".to_string(),
        }
    }
}

impl SegmentationConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

impl SessionSettings {
    pub fn min_frame_interval(&self) -> Duration {
        Duration::from_millis(self.min_frame_interval_ms)
    }
}

impl RefineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SignStreamError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SignStreamError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(SignStreamError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.model.window == 0 {
            return Err(SignStreamError::ConfigInvalidValue {
                key: "model.window".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.session.queue_capacity == 0 {
            return Err(SignStreamError::ConfigInvalidValue {
                key: "session.queue_capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.tts.enabled && self.tts.program.trim().is_empty() {
            return Err(SignStreamError::ConfigInvalidValue {
                key: "tts.program".to_string(),
                message: "must not be empty when tts is enabled".to_string(),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SIGNSTREAM_PORT → server.port
    /// - SIGNSTREAM_MODEL → model.path
    /// - SIGNSTREAM_LABELS → model.labels
    /// - SIGNSTREAM_ASSETS → assets.mapping
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("SIGNSTREAM_PORT")
            && !port.is_empty()
        {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid SIGNSTREAM_PORT"),
            }
        }

        if let Ok(model) = std::env::var("SIGNSTREAM_MODEL")
            && !model.is_empty()
        {
            self.model.path = PathBuf::from(model);
        }

        if let Ok(labels) = std::env::var("SIGNSTREAM_LABELS")
            && !labels.is_empty()
        {
            self.model.labels = PathBuf::from(labels);
        }

        if let Ok(assets) = std::env::var("SIGNSTREAM_ASSETS")
            && !assets.is_empty()
        {
            self.assets.mapping = PathBuf::from(assets);
        }

        self
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SignStreamError::Other(e.to_string()))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/signstream/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("signstream")
            .join("config.toml")
    }
}
