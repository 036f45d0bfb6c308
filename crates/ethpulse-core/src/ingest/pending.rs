use std::sync::Arc;

use super::state::IngestionGate;

/// Legacy LIFO feed over the pending stack.
///
/// Popping is the only way a SUSPENDED gate returns to ENABLED.
pub struct PendingQueue {
    gate: Arc<IngestionGate>,
    default_n: i64,
    max_n: i64,
}

impl PendingQueue {
    #[must_use]
    pub fn new(gate: Arc<IngestionGate>, default_n: i64, max_n: i64) -> Self {
        Self { gate, default_n, max_n }
    }

    /// Pops up to `n` hashes, most recent first.
    ///
    /// A missing `n` uses the configured default, larger values are clamped to the configured
    /// maximum, and `n <= 0` returns nothing.
    pub fn pop_n(&self, n: Option<i64>) -> Vec<String> {
        let requested = n.unwrap_or(self.default_n).min(self.max_n);
        match usize::try_from(requested) {
            Ok(count) if count > 0 => self.gate.pop(count),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn gate(&self) -> &Arc<IngestionGate> {
        &self.gate
    }
}
