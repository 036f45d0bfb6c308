//! Pending stack and the ENABLED/SUSPENDED gate, guarded together.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;

/// Backpressure gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    Enabled,
    Suspended,
}

/// Bounded hash buffer, appended at the tail and consumed from the tail.
///
/// Overflow drops from the head, so the most recent `capacity` hashes survive.
#[derive(Debug)]
pub struct PendingStack {
    entries: VecDeque<String>,
    capacity: usize,
}

impl PendingStack {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity.min(4096)), capacity }
    }

    /// Appends `hashes` in order and returns how many of the oldest entries were dropped.
    pub fn push_batch(&mut self, hashes: impl IntoIterator<Item = String>) -> usize {
        self.entries.extend(hashes);

        let overflow = self.entries.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.entries.drain(..overflow);
        }
        overflow
    }

    /// Removes up to `n` entries from the tail, most recently appended first.
    pub fn pop_n(&mut self, n: usize) -> Vec<String> {
        let take = n.min(self.entries.len());
        let mut popped = Vec::with_capacity(take);
        for _ in 0..take {
            if let Some(hash) = self.entries.pop_back() {
                popped.push(hash);
            }
        }
        popped
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }
}

/// Result of appending one block's hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub dropped: usize,
    pub length: usize,
    /// The append filled the stack and moved the gate to SUSPENDED.
    pub suspended: bool,
}

/// Point-in-time view of the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateStatus {
    pub state: GateState,
    pub length: usize,
    pub capacity: usize,
    pub resume_threshold: usize,
    pub last_block: Option<u64>,
}

#[derive(Debug)]
struct GateInner {
    stack: PendingStack,
    state: GateState,
    last_block: Option<u64>,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("resume threshold {resume_threshold} must be in 1..{capacity}")]
pub struct InvalidThreshold {
    pub capacity: usize,
    pub resume_threshold: usize,
}

/// The pending stack and gate state behind a single lock.
///
/// Fetch-driven suspend and pop-driven resume both read the stack length and write the state,
/// so they take the same lock. Only [`IngestionGate::append_block`] suspends and only
/// [`IngestionGate::pop`] resumes.
#[derive(Debug)]
pub struct IngestionGate {
    inner: Mutex<GateInner>,
    resume_threshold: usize,
}

impl IngestionGate {
    /// # Errors
    ///
    /// Returns [`InvalidThreshold`] unless `0 < resume_threshold < capacity`.
    pub fn new(capacity: usize, resume_threshold: usize) -> Result<Self, InvalidThreshold> {
        if resume_threshold == 0 || resume_threshold >= capacity {
            return Err(InvalidThreshold { capacity, resume_threshold });
        }

        Ok(Self {
            inner: Mutex::new(GateInner {
                stack: PendingStack::new(capacity),
                state: GateState::Enabled,
                last_block: None,
            }),
            resume_threshold,
        })
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.inner.lock().state
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.state() == GateState::Suspended
    }

    #[must_use]
    pub fn last_block(&self) -> Option<u64> {
        self.inner.lock().last_block
    }

    /// Records `block` as ingested and appends its hashes, suspending if the stack is full.
    pub fn append_block(&self, block: u64, hashes: Vec<String>) -> AppendOutcome {
        let mut inner = self.inner.lock();

        let dropped = inner.stack.push_batch(hashes);
        inner.last_block = Some(block);

        let suspended = inner.state == GateState::Enabled && inner.stack.is_full();
        if suspended {
            inner.state = GateState::Suspended;
        }

        AppendOutcome { dropped, length: inner.stack.len(), suspended }
    }

    /// Pops up to `n` hashes in LIFO order and resumes ingestion once the stack falls below
    /// the resume threshold. Publishes the new length and gate state as metrics.
    pub fn pop(&self, n: usize) -> Vec<String> {
        let mut inner = self.inner.lock();

        let popped = inner.stack.pop_n(n);
        if inner.state == GateState::Suspended && inner.stack.len() < self.resume_threshold {
            inner.state = GateState::Enabled;
            tracing::info!(
                length = inner.stack.len(),
                resume_threshold = self.resume_threshold,
                "pending stack drained below threshold, ingestion resumed"
            );
        }
        let (length, suspended) = (inner.stack.len(), inner.state == GateState::Suspended);
        drop(inner);

        crate::metrics::record_gate(length, suspended);
        popped
    }

    #[must_use]
    pub fn status(&self) -> GateStatus {
        let inner = self.inner.lock();
        GateStatus {
            state: inner.state,
            length: inner.stack.len(),
            capacity: inner.stack.capacity(),
            resume_threshold: self.resume_threshold,
            last_block: inner.last_block,
        }
    }
}
