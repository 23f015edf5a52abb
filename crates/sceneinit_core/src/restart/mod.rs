//! Restart-then-reinitialize coordination.
//!
//! # Responsibility
//! - Disambiguate "this connection event belongs to the restart the user
//!   just asked for" from unrelated connectivity churn.
//!
//! # Invariants
//! - At most one restart sequence is pending per coordinator; a new request
//!   supersedes the pending one (last request wins, no queueing).
//! - The status subscription is handed out once per coordinator instance.

mod coordinator;

pub use coordinator::{RestartCoordinator, RestartOutcome, RestartStage};
