//! Lexical SELECT-only guard shared by the store, the query gateway and the translator.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlValidationError {
    #[error("Query is empty")]
    Empty,

    #[error("Only SELECT queries are allowed")]
    NotSelect,

    #[error("Multiple statements are not allowed")]
    MultipleStatements,
}

/// Accepts `sql` only if its trimmed, case-insensitive form starts with `SELECT` and it holds a
/// single statement.
///
/// A trailing `;` is allowed. A `;` outside quotes followed by anything other than whitespace
/// is a stacked statement and is rejected.
///
/// # Errors
///
/// Returns the first rule the query violates.
pub fn ensure_select(sql: &str) -> Result<(), SqlValidationError> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(SqlValidationError::Empty);
    }

    if !starts_with_select(trimmed) {
        return Err(SqlValidationError::NotSelect);
    }

    if has_stacked_statement(trimmed) {
        return Err(SqlValidationError::MultipleStatements);
    }

    Ok(())
}

/// Prefix check only; the translator uses this before stripping anything else.
#[must_use]
pub fn starts_with_select(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SELECT"))
}

fn has_stacked_statement(sql: &str) -> bool {
    let mut quote: Option<char> = None;

    for (i, c) in sql.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                ';' => {
                    return sql[i + 1..].chars().any(|rest| !rest.is_whitespace() && rest != ';')
                }
                _ => {}
            },
        }
    }

    false
}
