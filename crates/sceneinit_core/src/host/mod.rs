//! Host platform seams.
//!
//! # Responsibility
//! - Define the trait contracts this core needs from the notebook platform:
//!   cells, the notebook cell sequence, the kernel link, and cell execution.
//! - Keep every collaborator injected; the core never reaches for an ambient
//!   registry or singleton.
//!
//! # Invariants
//! - The core mutates notebook structure only by inserting the data cell.
//! - Connection status values keep their wire spelling when serialized.

use crate::model::cell::{CellId, CellKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;

/// One notebook cell as seen by the scene core.
///
/// Metadata is the host's generic string-keyed JSON bag; typed interpretation
/// lives in [`crate::model::scene`].
pub trait NotebookCell {
    /// Stable cell identity.
    fn id(&self) -> CellId;
    /// Cell type discriminator.
    fn kind(&self) -> CellKind;
    /// Reads one metadata entry.
    fn metadata(&self, key: &str) -> Option<Value>;
    /// Writes one metadata entry, replacing any previous value.
    fn set_metadata(&mut self, key: &str, value: Value);
    /// Deletes one metadata entry. Deleting an absent key is a no-op.
    fn delete_metadata(&mut self, key: &str);
    /// Keys of all present metadata entries, in unspecified order.
    fn metadata_keys(&self) -> Vec<String>;
    /// Toggles the host's visual "part of the active scene" presentation.
    fn set_scene_marked(&mut self, marked: bool);
}

/// Ordered, insertable cell sequence owned by the host.
pub trait Notebook {
    type Cell: NotebookCell;

    /// Number of cells.
    fn len(&self) -> usize;
    /// Returns whether the notebook has no cells.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Borrows the cell at `index`.
    fn cell(&self, index: usize) -> Option<&Self::Cell>;
    /// Mutably borrows the cell at `index`.
    fn cell_mut(&mut self, index: usize) -> Option<&mut Self::Cell>;
    /// Inserts a fresh cell of `kind` at `index` and borrows it.
    ///
    /// The only structural mutation the scene core ever performs, used once
    /// per notebook to create the reserved data cell at index 0.
    fn insert_cell(&mut self, index: usize, kind: CellKind) -> &mut Self::Cell;
}

/// Kernel connection status, mirroring the host's wire spelling.
///
/// Only `Connecting` and `Connected` drive the restart latch; everything
/// else is observed and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

impl Display for ConnectionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let wire = match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        write!(f, "{wire}")
    }
}

/// Failure reported by the host when a restart cannot be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelUnavailable(pub String);

impl Display for KernelUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "kernel unavailable: {}", self.0)
    }
}

impl Error for KernelUnavailable {}

/// The host's live kernel connection.
pub trait KernelLink {
    /// Current connection status.
    fn status(&self) -> ConnectionStatus;
    /// Asks the host to restart the kernel behind this connection.
    fn restart(&mut self) -> Result<(), KernelUnavailable>;
}

/// Collaborator that submits one cell for execution.
///
/// The core hands over code cells in notebook order; delivery, queueing and
/// output handling stay on the host side.
pub trait CellExecutor {
    fn execute(&mut self, cell_id: CellId);
}
