pub const SYSTEM_PROMPT: &str = "You translate questions about Ethereum transactions into a \
single SQLite SELECT statement. Reply with the SQL only, no explanation.";

const SCHEMA: &str = r"CREATE TABLE transactions (
    hash         TEXT PRIMARY KEY,   -- 0x-prefixed lowercase hex
    block_number INTEGER NOT NULL,
    from_address TEXT NOT NULL,      -- 0x-prefixed lowercase hex
    to_address   TEXT,               -- NULL for contract creation
    value        TEXT NOT NULL,      -- wei as a decimal string, no leading zeros
    gas_price    TEXT NOT NULL,      -- wei as a decimal string
    gas_limit    INTEGER NOT NULL,
    nonce        INTEGER NOT NULL,
    data         TEXT NOT NULL,
    timestamp    TEXT NOT NULL,      -- RFC 3339, block time
    created_at   TEXT NOT NULL       -- RFC 3339, time the row was ingested
);";

/// Builds the user prompt for `question`.
#[must_use]
pub fn build_prompt(question: &str) -> String {
    format!(
        "Schema:\n{SCHEMA}\n\nRules:\n- Only SELECT statements.\n- 1 ETH = 10^18 wei.\n- \
         Compare value by LENGTH(value) first, then as text. Never CAST it to REAL.\n- \
         Default to ORDER BY created_at DESC LIMIT 10 when no order or limit is asked for.\n\n\
         Question: {}\nSQL:",
        question.trim()
    )
}

/// Strips Markdown code fences and surrounding whitespace from a model reply.
#[must_use]
pub fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // Drop the info string (```sql) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);

    body.trim().to_string()
}
