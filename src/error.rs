//! Error types for inbox triage.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Message source failures. These abort the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Source {name} unavailable: {reason}")]
    Unavailable { name: String, reason: String },

    #[error("Authentication failed for source {name}: {reason}")]
    AuthFailed { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single raw message could not be turned into a `Message`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    #[error("Message {id} is empty")]
    Empty { id: String },

    #[error("Message {id} could not be parsed")]
    Unparseable { id: String },
}

/// Classifier / drafter call failures.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Provider {provider} returned an empty response")]
    EmptyResponse { provider: String },
}

/// Failures transmitting an approved reply.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    #[error("Dispatch is not configured")]
    NotConfigured,

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Transport failed: {0}")]
    Transport(String),

    #[error("Dispatch timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Review state machine errors.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Entry {id} not found")]
    NotFound { id: String },

    #[error("Entry {id} already in state {state}, cannot transition to {target}")]
    InvalidTransition {
        id: String,
        state: String,
        target: String,
    },

    #[error("Entry {id} has no draft to send")]
    NoDraft { id: String },

    #[error("Entry {id} does not take a reply")]
    NotReplyable { id: String },

    #[error("Dispatch for entry {id} failed: {source}")]
    DispatchFailed {
        id: String,
        #[source]
        source: DispatchError,
    },
}

/// Export failures.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
