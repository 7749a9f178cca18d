//! Error Explainer - plain-language diagnosis of a failed statement

use crate::error::Result;
use crate::llm::{CompletionRequest, ReasoningClient};
use crate::prompts::{explanation_prompt, EXPLANATION_SYSTEM_PROMPT, EXPLANATION_TEMPERATURE};
use std::sync::Arc;

pub struct ErrorExplainer {
    client: Arc<dyn ReasoningClient>,
}

impl ErrorExplainer {
    pub fn new(client: Arc<dyn ReasoningClient>) -> Self {
        Self { client }
    }

    pub async fn explain(&self, sql: &str, error_message: &str) -> Result<String> {
        let request = CompletionRequest::new(
            EXPLANATION_SYSTEM_PROMPT,
            explanation_prompt(sql, error_message),
            EXPLANATION_TEMPERATURE,
        );
        let reply = self.client.complete(&request).await?;
        Ok(reply.trim().to_string())
    }
}
