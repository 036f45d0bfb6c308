//! Deterministic keyword rules used when no LLM is available or the LLM fails.
//!
//! Rules are evaluated in a fixed order and the first match wins. Each rule strips the span it
//! matched before a row count is looked for, so "block 123 transactions" does not read 123 as
//! a limit.

use regex::Regex;
use std::sync::LazyLock;

/// Limit used when the text carries no row count.
pub const DEFAULT_RULE_LIMIT: i64 = 10;

const WEI_PER_ETH_DIGITS: usize = 18;
const ONE_ETH_WEI: &str = "1000000000000000000";

static ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0x[0-9a-f]{40}\b").expect("valid address regex"));
static ETH_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+)(?:\.(\d+))?\s*eth\b").expect("valid eth amount regex")
});
static LESS_THAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(less|below|under|smaller|fewer)\b").expect("valid comparison regex")
});
static LARGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(large|larger|largest|big|biggest|expensive|whales?)\b")
        .expect("valid size regex")
});
static COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bhow many\b|\bcount\b").expect("valid count regex"));
static BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bblock\s+#?(\d+)\b").expect("valid block regex"));
static RECENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(recent|latest|last|newest)\b").expect("valid recent regex"));
static COUNT_BEFORE_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+)\s+(?:most\s+)?(?:recent|latest|last|newest|transactions?|txs?)\b")
        .expect("valid row count regex")
});
static COUNT_AFTER_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:top|first|last|latest|recent|newest)\s+(\d+)\b")
        .expect("valid row count regex")
});
static ANY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\b").expect("valid number regex"));

/// Keyword-pattern SQL generator with a fixed precedence table.
#[derive(Debug, Clone)]
pub struct RuleBasedConverter {
    max_limit: i64,
}

impl RuleBasedConverter {
    #[must_use]
    pub fn new(max_limit: i64) -> Self {
        Self { max_limit: max_limit.max(1) }
    }

    /// Converts `text` into a SELECT statement. Always produces a query.
    #[must_use]
    pub fn convert(&self, text: &str) -> String {
        let text = text.to_lowercase();

        if let Some(m) = ADDRESS.find(&text) {
            let address = m.as_str();
            let limit = self.row_count(&remove_span(&text, m.range()), false);
            return format!(
                "SELECT * FROM transactions WHERE from_address = '{address}' OR to_address = \
                 '{address}' ORDER BY created_at DESC LIMIT {limit};"
            );
        }

        if let Some(caps) = ETH_AMOUNT.captures(&text) {
            let whole = caps.get(1).map_or("0", |m| m.as_str());
            let fraction = caps.get(2).map_or("", |m| m.as_str());
            let wei = eth_to_wei(whole, fraction);
            let op = if LESS_THAN.is_match(&text) { "<" } else { ">" };
            let span = caps.get(0).map_or(0..0, |m| m.range());
            let limit = self.row_count(&remove_span(&text, span), false);
            let filter = wei_compare(op, &wei);
            return format!(
                "SELECT * FROM transactions WHERE {filter} ORDER BY created_at DESC LIMIT {limit};"
            );
        }

        if LARGE.is_match(&text) {
            let limit = self.row_count(&text, false);
            let filter = wei_compare(">", ONE_ETH_WEI);
            return format!(
                "SELECT * FROM transactions WHERE {filter} \
                 ORDER BY LENGTH(value) DESC, value DESC LIMIT {limit};"
            );
        }

        if COUNT.is_match(&text) {
            return "SELECT COUNT(*) AS total FROM transactions;".to_string();
        }

        if let Some(caps) = BLOCK.captures(&text) {
            let block = caps.get(1).map_or("0", |m| m.as_str());
            let span = caps.get(0).map_or(0..0, |m| m.range());
            let limit = self.row_count(&remove_span(&text, span), false);
            return format!(
                "SELECT * FROM transactions WHERE block_number = {block} \
                 ORDER BY created_at DESC LIMIT {limit};"
            );
        }

        if RECENT.is_match(&text) {
            let limit = self.row_count(&text, true);
            return format!("SELECT * FROM transactions ORDER BY created_at DESC LIMIT {limit};");
        }

        format!("SELECT * FROM transactions ORDER BY created_at DESC LIMIT {DEFAULT_RULE_LIMIT};")
    }

    /// Extracts a row count, clamped to `1..=max_limit`.
    ///
    /// `any_number` lets a bare number count when no count phrase is present.
    fn row_count(&self, text: &str, any_number: bool) -> i64 {
        let captured = COUNT_BEFORE_NOUN
            .captures(text)
            .or_else(|| COUNT_AFTER_KEYWORD.captures(text))
            .or_else(|| any_number.then(|| ANY_NUMBER.captures(text)).flatten())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str());

        captured
            .map(|digits| digits.parse::<i64>().unwrap_or(self.max_limit))
            .unwrap_or(DEFAULT_RULE_LIMIT)
            .clamp(1, self.max_limit)
    }
}

fn remove_span(text: &str, span: std::ops::Range<usize>) -> String {
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..span.start]);
    out.push(' ');
    out.push_str(&text[span.end..]);
    out
}

/// Exact comparison of the `value` column against `wei`.
///
/// Stored values are canonical decimal strings, so the longer string is the larger number and
/// equal lengths compare lexically. Casting to REAL would lose precision above 2^53 wei.
fn wei_compare(op: &str, wei: &str) -> String {
    let len = wei.len();
    format!("(LENGTH(value) {op} {len} OR (LENGTH(value) = {len} AND value {op} '{wei}'))")
}

/// `whole.fraction` ETH in wei as a decimal string, without going through floats.
///
/// Fraction digits beyond 18 are below one wei and are truncated.
fn eth_to_wei(whole: &str, fraction: &str) -> String {
    let fraction: String = fraction.chars().take(WEI_PER_ETH_DIGITS).collect();
    let digits = format!("{whole}{fraction:0<WEI_PER_ETH_DIGITS$}");
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
