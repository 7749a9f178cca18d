//! SQL Translator - natural-language question to candidate SQL

use crate::agents::extract_sql;
use crate::error::{AutofixError, Result};
use crate::llm::{CompletionRequest, ReasoningClient};
use crate::prompts::{translation_prompt, TRANSLATION_SYSTEM_PROMPT, TRANSLATION_TEMPERATURE};
use std::sync::Arc;
use tracing::debug;

pub struct SqlTranslator {
    client: Arc<dyn ReasoningClient>,
}

impl SqlTranslator {
    pub fn new(client: Arc<dyn ReasoningClient>) -> Self {
        Self { client }
    }

    /// Translate `question` into SQL. The result is not validated; the store decides.
    pub async fn translate(&self, question: &str, schema: Option<&str>) -> Result<String> {
        if question.trim().is_empty() {
            return Err(AutofixError::InvalidRequest("question must not be empty".to_string()));
        }

        let request = CompletionRequest::new(
            TRANSLATION_SYSTEM_PROMPT,
            translation_prompt(question, schema),
            TRANSLATION_TEMPERATURE,
        );
        let reply = self.client.complete(&request).await?;
        let sql = extract_sql(&reply);

        debug!(%sql, "Translated question");
        Ok(sql)
    }
}
