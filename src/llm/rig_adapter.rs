//! Bridges a rig `Agent` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::agent::Agent;
use rig::completion::{CompletionModel, Prompt};

use crate::error::LlmError;

use super::provider::LlmProvider;

/// Adapter wrapping a configured rig agent.
pub struct RigAdapter<M: CompletionModel> {
    agent: Agent<M>,
    provider: &'static str,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(agent: Agent<M>, provider: &'static str, model_name: &str) -> Self {
        Self {
            agent,
            provider,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.agent
            .prompt(prompt.to_string())
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.provider.to_string(),
                reason: e.to_string(),
            })
    }
}
