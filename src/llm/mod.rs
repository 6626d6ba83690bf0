//! LLM integration.
//!
//! Supports:
//! - **Anthropic**: Direct API access via rig-core
//! - **OpenAI**: Direct API access via rig-core
//!
//! The classifier and the drafter are two agents built from the same
//! config with different sampling settings. Both are plain text oracles.

pub mod provider;
mod rig_adapter;

pub use provider::{LlmProvider, complete_with_timeout};
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::{ConfigError, LlmError};

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    /// Model used when `TRIAGE_MODEL` is unset.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::InvalidValue {
                key: "TRIAGE_LLM_BACKEND".into(),
                message: format!("unknown backend '{other}'"),
            }),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// What the provider is used for. Decides sampling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmRole {
    Classifier,
    Drafter,
}

impl LlmRole {
    fn temperature(&self) -> f64 {
        match self {
            Self::Classifier => 0.1,
            Self::Drafter => 0.4,
        }
    }

    fn max_tokens(&self) -> u64 {
        match self {
            Self::Classifier => 256,
            Self::Drafter => 800,
        }
    }
}

/// Create an LLM provider for the given role.
pub fn create_provider(config: &LlmConfig, role: LlmRole) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Anthropic => create_anthropic_provider(config, role),
        LlmBackend::OpenAi => create_openai_provider(config, role),
    }
}

fn create_anthropic_provider(
    config: &LlmConfig,
    role: LlmRole,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret()).map_err(|e| {
            LlmError::RequestFailed {
                provider: "anthropic".to_string(),
                reason: format!("Failed to create Anthropic client: {}", e),
            }
        })?;

    let agent = client
        .agent(config.model.as_str())
        .temperature(role.temperature())
        .max_tokens(role.max_tokens())
        .build();
    tracing::info!(role = ?role, "Using Anthropic (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(agent, "anthropic", &config.model)))
}

fn create_openai_provider(
    config: &LlmConfig,
    role: LlmRole,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            }
        })?;

    let agent = client
        .agent(config.model.as_str())
        .temperature(role.temperature())
        .max_tokens(role.max_tokens())
        .build();
    tracing::info!(role = ?role, "Using OpenAI (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(agent, "openai", &config.model)))
}
