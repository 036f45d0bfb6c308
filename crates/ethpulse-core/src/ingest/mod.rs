//! Block ingestion and the bounded pending stack.
//!
//! The [`Ingestor`] appends, the [`PendingQueue`] pops. Both go through the one
//! [`IngestionGate`] that owns the stack and the ENABLED/SUSPENDED flag.

pub mod ingestor;
pub mod pending;
pub mod state;

pub use ingestor::{Ingestor, TickOutcome};
pub use pending::PendingQueue;
pub use state::{
    AppendOutcome, GateState, GateStatus, IngestionGate, InvalidThreshold, PendingStack,
};
