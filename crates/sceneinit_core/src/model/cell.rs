//! Cell identity and type discrimination.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one notebook cell.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CellId = Uuid;

/// Notebook cell type discriminator.
///
/// Only `Code` cells are ever executed by scene initialization; the other
/// kinds participate in tagging but are skipped at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Executable source cell.
    Code,
    /// Rendered markdown cell.
    Markdown,
    /// Unrendered raw cell. The reserved data cell is created with this kind.
    Raw,
}

impl CellKind {
    /// Returns whether cells of this kind are eligible for execution.
    pub fn is_executable(self) -> bool {
        matches!(self, Self::Code)
    }
}
