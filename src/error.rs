//! Error types for signstream.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignStreamError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Frame decoding / landmark detection errors
    #[error("Frame decode failed: {message}")]
    FrameDecode { message: String },

    // Classifier errors
    #[error("Sign model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Sign model load failed: {message}")]
    ModelLoad { message: String },

    #[error("Input shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Sign model inference failed: {message}")]
    Inference { message: String },

    #[error("Label table error: {message}")]
    LabelTable { message: String },

    // Collaborator errors
    #[error("Text refinement failed: {message}")]
    Refinement { message: String },

    #[error("Speech synthesis failed: {message}")]
    Synthesis { message: String },

    // Asset map errors
    #[error("Sign asset map error: {message}")]
    AssetMap { message: String },

    // Request validation
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SignStreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = SignStreamError::ConfigFileNotFound {
            path: "/etc/signstream.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /etc/signstream.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = SignStreamError::ConfigInvalidValue {
            key: "segmentation.pause_ms".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for segmentation.pause_ms: must be positive"
        );
    }

    #[test]
    fn test_frame_decode_display() {
        let error = SignStreamError::FrameDecode {
            message: "expected JSON object".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Frame decode failed: expected JSON object"
        );
    }

    #[test]
    fn test_shape_mismatch_display() {
        let error = SignStreamError::ShapeMismatch {
            expected: "30x1662".to_string(),
            actual: "30x63".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Input shape mismatch: expected 30x1662, got 30x63"
        );
    }

    #[test]
    fn test_inference_display() {
        let error = SignStreamError::Inference {
            message: "NaN in logits".to_string(),
        };
        assert_eq!(error.to_string(), "Sign model inference failed: NaN in logits");
    }

    #[test]
    fn test_refinement_display() {
        let error = SignStreamError::Refinement {
            message: "HTTP 429".to_string(),
        };
        assert_eq!(error.to_string(), "Text refinement failed: HTTP 429");
    }

    #[test]
    fn test_synthesis_display() {
        let error = SignStreamError::Synthesis {
            message: "espeak-ng exited with 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Speech synthesis failed: espeak-ng exited with 1"
        );
    }

    #[test]
    fn test_invalid_request_display() {
        let error = SignStreamError::InvalidRequest {
            message: "text must not be empty".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid request: text must not be empty");
    }

    #[test]
    fn test_other_display() {
        let error = SignStreamError::Other("unexpected error".to_string());
        assert_eq!(error.to_string(), "unexpected error");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: SignStreamError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: SignStreamError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: SignStreamError = io_error.into();
        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<SignStreamError>();
        assert_sync::<SignStreamError>();
    }
}
