//! Refiner trait for turning raw sign sequences into natural sentences.

use crate::error::{Result, SignStreamError};
use async_trait::async_trait;
use std::sync::Arc;

/// Build the instruction sent to a language model for one raw phrase.
pub fn refinement_prompt(raw: &str) -> String {
    format!(
        "Convert this raw sign sequence into a natural English sentence: '{raw}'. Keep it short and meaningful."
    )
}

/// Trait for sentence refinement.
///
/// Implementations receive the space-joined raw signs (or free text on the
/// text-to-sign path) and return a cleaned-up sentence.
#[async_trait]
pub trait Refiner: Send + Sync {
    /// Refine a raw phrase into a sentence.
    async fn refine(&self, raw: &str) -> Result<String>;

    /// Return the name of this refiner for logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Refiner + ?Sized> Refiner for Arc<T> {
    async fn refine(&self, raw: &str) -> Result<String> {
        (**self).refine(raw).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Refiner that returns its input unchanged.
///
/// Used when no refinement provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRefiner;

#[async_trait]
impl Refiner for PassthroughRefiner {
    async fn refine(&self, raw: &str) -> Result<String> {
        Ok(raw.to_string())
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

/// Mock refiner for testing
#[derive(Debug, Clone, Default)]
pub struct MockRefiner {
    response: Option<String>,
    should_fail: bool,
}

impl MockRefiner {
    /// Create a mock that echoes its input
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    /// Configure the mock to fail on refine
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait]
impl Refiner for MockRefiner {
    async fn refine(&self, raw: &str) -> Result<String> {
        if self.should_fail {
            return Err(SignStreamError::Refinement {
                message: "mock refinement failure".to_string(),
            });
        }
        Ok(self.response.clone().unwrap_or_else(|| raw.to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
