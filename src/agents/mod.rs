//! Model-backed pipeline steps
//!
//! Each agent owns a handle to the shared [`ReasoningClient`](crate::llm::ReasoningClient),
//! builds its prompt, makes exactly one call and trims the reply.

pub mod explainer;
pub mod repairer;
pub mod translator;

pub use explainer::ErrorExplainer;
pub use repairer::QueryRepairer;
pub use translator::SqlTranslator;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Only known dialect tags are stripped, so a fence opening straight onto SQL keeps its first word
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)```(?:(?i:sql|sqlite|postgres(?:ql)?|mysql)\b[ \t]*\r?\n?)?(.*?)```").unwrap();
}

/// Pull the SQL out of a model reply.
///
/// Plain replies are only trimmed. A reply wrapped in a markdown fence yields
/// the first fenced body.
pub fn extract_sql(reply: &str) -> String {
    let trimmed = reply.trim();

    if let Some(body) = CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        let body = body.as_str().trim();
        if !body.is_empty() {
            return body.to_string();
        }
    }

    // Unterminated fence
    trimmed
        .trim_start_matches("```sql")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .to_string()
}
