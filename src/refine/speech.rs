//! Speech synthesis for finished sentences.

use crate::defaults;
use crate::error::{Result, SignStreamError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;

/// File stem for synthesized speech: the words of `text` joined by `_`.
///
/// Characters outside `[A-Za-z0-9_-]` are dropped so the stem is always a
/// plain file name.
pub fn speech_file_stem(text: &str) -> String {
    let stem = text
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if stem.is_empty() {
        "speech".to_string()
    } else {
        stem
    }
}

/// Trait for text-to-speech.
///
/// Returns a handle (path) of the generated audio asset.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<String>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Synthesizer + ?Sized> Synthesizer for Arc<T> {
    async fn synthesize(&self, text: &str) -> Result<String> {
        (**self).synthesize(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Synthesizer that runs an external TTS program.
///
/// Arguments may contain the placeholders `{output}` (target file path) and
/// `{text}` (sentence to speak), e.g. `espeak-ng -w {output} -- {text}`.
/// Sentences come from clients, so `{text}` belongs after `--` where the
/// program cannot read it as an option.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    output_dir: PathBuf,
    extension: String,
}

impl CommandSynthesizer {
    pub fn new(program: &str, args: Vec<String>, output_dir: &Path) -> Self {
        Self {
            program: program.to_string(),
            args,
            output_dir: output_dir.to_path_buf(),
            extension: "wav".to_string(),
        }
    }

    /// The default espeak-ng invocation writing WAV files to `tts/`.
    pub fn espeak() -> Self {
        Self::new(
            "espeak-ng",
            vec![
                "-w".to_string(),
                "{output}".to_string(),
                "--".to_string(),
                "{text}".to_string(),
            ],
            Path::new(defaults::TTS_DIR),
        )
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn output_path(&self, text: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", speech_file_stem(text), self.extension))
    }

    fn expand_args(&self, output: &Path, text: &str) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{output}", &output).replace("{text}", text))
            .collect()
    }
}

#[async_trait]
impl Synthesizer for CommandSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output = self.output_path(text);

        let result = Command::new(&self.program)
            .args(self.expand_args(&output, text))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SignStreamError::Synthesis {
                message: format!("failed to run {}: {e}", self.program),
            })?;

        if !result.status.success() {
            return Err(SignStreamError::Synthesis {
                message: format!(
                    "{} exited with {}: {}",
                    self.program,
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim()
                ),
            });
        }

        Ok(output.to_string_lossy().into_owned())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Mock synthesizer for testing
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    output_dir: String,
    should_fail: bool,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            output_dir: defaults::TTS_DIR.to_string(),
            should_fail: false,
        }
    }

    /// Configure the mock to fail on synthesize
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<String> {
        if self.should_fail {
            return Err(SignStreamError::Synthesis {
                message: "mock synthesis failure".to_string(),
            });
        }
        Ok(format!("{}/{}.wav", self.output_dir, speech_file_stem(text)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
