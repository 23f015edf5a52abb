//! Scene state ownership layer.
//!
//! # Responsibility
//! - Provide the only read/write path for scene metadata, so the data cell
//!   invariants are enforced in one place.
//!
//! # Invariants
//! - Failed operations mutate nothing: every precondition is checked before
//!   the first write (validate-then-mutate).

pub mod scene_store;
