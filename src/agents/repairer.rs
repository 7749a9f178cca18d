//! Query Repairer - one corrected statement from the failed SQL and its diagnosis

use crate::agents::extract_sql;
use crate::error::Result;
use crate::llm::{CompletionRequest, ReasoningClient};
use crate::prompts::{repair_prompt, REPAIR_SYSTEM_PROMPT, REPAIR_TEMPERATURE};
use std::sync::Arc;

pub struct QueryRepairer {
    client: Arc<dyn ReasoningClient>,
}

impl QueryRepairer {
    pub fn new(client: Arc<dyn ReasoningClient>) -> Self {
        Self { client }
    }

    pub async fn repair(&self, original_sql: &str, explanation: &str) -> Result<String> {
        let request = CompletionRequest::new(
            REPAIR_SYSTEM_PROMPT,
            repair_prompt(original_sql, explanation),
            REPAIR_TEMPERATURE,
        );
        let reply = self.client.complete(&request).await?;
        Ok(extract_sql(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedClient;

    #[tokio::test]
    async fn test_repair_returns_bare_sql() {
        let client = Arc::new(ScriptedClient::replying(&["```sql\nSELECT first_name FROM users\n```"]));
        let repairer = QueryRepairer::new(client.clone());

        let sql = repairer
            .repair("SELECT nme FROM users", "Use first_name instead of nme.")
            .await
            .unwrap();
        assert_eq!(sql, "SELECT first_name FROM users");

        let request = &client.recorded()[0];
        assert_eq!(request.temperature, 0.0);
        assert!(request.messages[0].content.contains("Return ONLY valid SQL"));
        assert!(request.messages[1].content.contains("Original SQL: SELECT nme FROM users"));
        assert!(request.messages[1].content.contains("Use first_name instead of nme."));
    }
}
