//! Typed domain model for scene metadata.
//!
//! # Responsibility
//! - Define the canonical records behind the notebook's metadata keys.
//! - Keep the stringly-typed metadata boundary inside one translation layer.
//!
//! # Invariants
//! - The persisted key schema (`reinit_data`, `scenes`, `present_scene`,
//!   `init_scene__<name>`) stays byte-compatible with existing notebooks.

pub mod cell;
pub mod scene;
