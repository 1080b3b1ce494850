//! Adapter interfaces for the remote audit oracle.
//!
//! An oracle turns a prompt into model text. Everything about prompts and
//! how the answer is interpreted lives in `core::assistant`; adapters only
//! move bytes and classify failures.

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::GeminiOracle;

/// Sampling parameters sent with every generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_k: 40,
            top_p: 0.8,
            max_output_tokens: 2048,
        }
    }
}

/// Oracle failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("Oracle request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Oracle rate limit exceeded")]
    RateLimited,

    #[error("Malformed oracle response: {0}")]
    Malformed(String),

    #[error("Oracle returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Oracle request failed: {0}")]
    Transport(String),

    #[error("No API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
}

/// Trait for generative-language backends
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Send one prompt and return the model's text.
    ///
    /// An absent answer is `Ok(String::new())`, not an error.
    async fn generate(&self, prompt: &str, config: &GenerationConfig)
        -> Result<String, OracleError>;
}
