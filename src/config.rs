//! Configuration types.
//!
//! Everything is read from environment variables; `Default` gives the same
//! values for library callers and tests.

use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default cap on messages per run.
const DEFAULT_MAX_MESSAGES: usize = 10;

/// Characters of body kept on the stored `Message`.
const DEFAULT_STORED_BODY_CHARS: usize = 2000;

/// Characters of body sent to the classifier.
const DEFAULT_CLASSIFY_BODY_CHARS: usize = 800;

/// Characters of body sent to the drafter.
const DEFAULT_DRAFT_BODY_CHARS: usize = 600;

/// Batch / workflow configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Maximum number of messages processed per run.
    pub max_messages: usize,
    /// Body prefix kept on the stored message (display bound).
    pub stored_body_chars: usize,
    /// Body prefix included in the classifier prompt.
    pub classify_body_chars: usize,
    /// Body prefix included in the drafter prompt.
    pub draft_body_chars: usize,
    /// Timeout for each classifier / drafter call.
    pub call_timeout: Duration,
    /// Timeout for each dispatch call.
    pub dispatch_timeout: Duration,
    /// Messages processed in parallel. 1 = strictly sequential.
    pub concurrency: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            stored_body_chars: DEFAULT_STORED_BODY_CHARS,
            classify_body_chars: DEFAULT_CLASSIFY_BODY_CHARS,
            draft_body_chars: DEFAULT_DRAFT_BODY_CHARS,
            call_timeout: Duration::from_secs(60),
            dispatch_timeout: Duration::from_secs(30),
            concurrency: 1,
        }
    }
}

impl TriageConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_messages: env_parse("TRIAGE_MAX_MESSAGES").unwrap_or(defaults.max_messages),
            stored_body_chars: env_parse("TRIAGE_STORED_BODY_CHARS")
                .unwrap_or(defaults.stored_body_chars),
            classify_body_chars: env_parse("TRIAGE_CLASSIFY_BODY_CHARS")
                .unwrap_or(defaults.classify_body_chars),
            draft_body_chars: env_parse("TRIAGE_DRAFT_BODY_CHARS")
                .unwrap_or(defaults.draft_body_chars),
            call_timeout: env_parse("TRIAGE_CALL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.call_timeout),
            dispatch_timeout: env_parse("TRIAGE_DISPATCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.dispatch_timeout),
            concurrency: env_parse::<usize>("TRIAGE_CONCURRENCY")
                .unwrap_or(defaults.concurrency)
                .max(1),
        }
    }
}

/// SMTP settings for the dispatch gateway.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: secrecy::SecretString,
    pub from_address: String,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `EMAIL_SMTP_HOST` is not set (dispatch disabled).
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("EMAIL_SMTP_HOST").ok()?;
        let smtp_port: u16 = env_parse("EMAIL_SMTP_PORT").unwrap_or(587);
        let username = std::env::var("EMAIL_USERNAME").unwrap_or_default();
        let password = std::env::var("EMAIL_PASSWORD").unwrap_or_default();
        let from_address =
            std::env::var("EMAIL_FROM_ADDRESS").unwrap_or_else(|_| username.clone());

        Some(Self {
            smtp_host,
            smtp_port,
            username,
            password: secrecy::SecretString::from(password),
            from_address,
        })
    }
}

impl LlmConfig {
    /// Build the LLM config from environment variables.
    ///
    /// `TRIAGE_LLM_BACKEND` selects the provider (default `anthropic`); the
    /// matching API key variable is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match std::env::var("TRIAGE_LLM_BACKEND") {
            Ok(value) => value.parse::<LlmBackend>()?,
            Err(_) => LlmBackend::Anthropic,
        };

        let key_var = match backend {
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
        };
        let api_key = std::env::var(key_var)
            .map_err(|_| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = std::env::var("TRIAGE_MODEL").unwrap_or_else(|_| backend.default_model().to_string());

        Ok(Self {
            backend,
            api_key: secrecy::SecretString::from(api_key),
            model,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bound_classifier_below_stored_body() {
        let config = TriageConfig::default();
        assert!(config.classify_body_chars < config.stored_body_chars);
        assert!(config.draft_body_chars < config.stored_body_chars);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.max_messages, 10);
    }

    #[test]
    fn backend_parse_rejects_unknown() {
        assert!("anthropic".parse::<LlmBackend>().is_ok());
        assert!("OpenAI".parse::<LlmBackend>().is_ok());
        assert!("gemini".parse::<LlmBackend>().is_err());
    }
}
