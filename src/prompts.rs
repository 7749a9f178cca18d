//! Prompts - System instructions and user-message builders for the three model steps

/// Stands in for missing schema context so the translation prompt keeps one layout
pub const SCHEMA_PLACEHOLDER: &str = "(Schema not provided)";

/// Translation and repair must be reproducible
pub const TRANSLATION_TEMPERATURE: f32 = 0.0;
pub const EXPLANATION_TEMPERATURE: f32 = 0.3;
pub const REPAIR_TEMPERATURE: f32 = 0.0;

pub const TRANSLATION_SYSTEM_PROMPT: &str = r#"You are an expert SQL query generator.
You will be given:
- Database schema: table names, columns, data types, constraints, and sample values.
- A user's natural language question.

Your task:
1. Analyze the user's request.
2. Use only the provided schema, column names, and metadata.
3. Generate the most accurate SQL query to answer the request.

Rules:
- Respond ONLY with SQL.
- Do not explain or add text outside of the SQL query.
- Use exact table and column names from the schema.
- Ensure queries run without syntax errors."#;

pub const EXPLANATION_SYSTEM_PROMPT: &str = "You explain SQL errors clearly in plain language.";

pub const REPAIR_SYSTEM_PROMPT: &str = r#"You are a SQL fixer. Correct the broken SQL query based on the explanation.
Return ONLY valid SQL without backticks, comments, or extra text."#;

pub fn translation_prompt(question: &str, schema: Option<&str>) -> String {
    let schema = schema
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(SCHEMA_PLACEHOLDER);

    format!("Schema:\n{}\n\nUser question:\n{}\n", schema, question)
}

pub fn explanation_prompt(sql: &str, error_message: &str) -> String {
    format!("SQL: {}\nError: {}\nExplain the issue.", sql, error_message)
}

pub fn repair_prompt(sql: &str, explanation: &str) -> String {
    format!("Original SQL: {}\nError Explanation: {}\nFix the SQL.", sql, explanation)
}
