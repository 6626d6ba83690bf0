//! Text-in / text-out provider trait shared by the classifier and drafter.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;

/// An opaque language-model oracle.
///
/// Implementations return the raw response text. No structure is assumed;
/// callers parse defensively.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Send a prompt and return the response text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Run `complete` under a timeout and reject blank responses.
///
/// No retries happen here; a failed call is reported to the caller as is.
pub async fn complete_with_timeout(
    provider: &dyn LlmProvider,
    prompt: &str,
    timeout: Duration,
) -> Result<String, LlmError> {
    let text = tokio::time::timeout(timeout, provider.complete(prompt))
        .await
        .map_err(|_| LlmError::Timeout {
            provider: provider.model_name().to_string(),
            timeout,
        })??;

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse {
            provider: provider.model_name().to_string(),
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    #[async_trait]
    impl LlmProvider for Slow {
        fn model_name(&self) -> &str {
            "slow"
        }
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".into())
        }
    }

    struct Blank;

    #[async_trait]
    impl LlmProvider for Blank {
        fn model_name(&self) -> &str {
            "blank"
        }
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok("   \n".into())
        }
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let err = complete_with_timeout(&Slow, "hi", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout { .. }));
    }

    #[tokio::test]
    async fn blank_response_is_an_error() {
        let err = complete_with_timeout(&Blank, "hi", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse { .. }));
    }
}
