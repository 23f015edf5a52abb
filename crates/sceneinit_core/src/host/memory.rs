//! In-memory reference host.
//!
//! # Responsibility
//! - Provide a self-contained [`Notebook`]/[`KernelLink`] implementation for
//!   tests and for embedders that have no platform binding yet.
//!
//! # Invariants
//! - Cell metadata behaves like the host's JSON bag: last write wins,
//!   deleting an absent key is a no-op.

use crate::host::{ConnectionStatus, KernelLink, KernelUnavailable, Notebook, NotebookCell};
use crate::model::cell::{CellId, CellKind};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Heap-backed cell with a JSON metadata bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCell {
    id: CellId,
    kind: CellKind,
    /// Source text; carried for embedder convenience, never read by the core.
    pub source: String,
    metadata: BTreeMap<String, Value>,
    scene_marked: bool,
}

impl MemoryCell {
    /// Creates an empty cell of the given kind.
    pub fn new(kind: CellKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            source: String::new(),
            metadata: BTreeMap::new(),
            scene_marked: false,
        }
    }

    /// Creates a code cell with source text.
    pub fn code(source: impl Into<String>) -> Self {
        let mut cell = Self::new(CellKind::Code);
        cell.source = source.into();
        cell
    }

    /// Returns the current presentation mark state.
    pub fn scene_marked(&self) -> bool {
        self.scene_marked
    }
}

impl NotebookCell for MemoryCell {
    fn id(&self) -> CellId {
        self.id
    }

    fn kind(&self) -> CellKind {
        self.kind
    }

    fn metadata(&self, key: &str) -> Option<Value> {
        self.metadata.get(key).cloned()
    }

    fn set_metadata(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }

    fn delete_metadata(&mut self, key: &str) {
        self.metadata.remove(key);
    }

    fn metadata_keys(&self) -> Vec<String> {
        self.metadata.keys().cloned().collect()
    }

    fn set_scene_marked(&mut self, marked: bool) {
        self.scene_marked = marked;
    }
}

/// Growable cell sequence.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryNotebook {
    cells: Vec<MemoryCell>,
}

impl MemoryNotebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a notebook from prepared cells.
    pub fn from_cells(cells: Vec<MemoryCell>) -> Self {
        Self { cells }
    }

    /// Appends one cell and returns its id.
    pub fn push_cell(&mut self, cell: MemoryCell) -> CellId {
        let id = cell.id();
        self.cells.push(cell);
        id
    }

    /// Iterates all cells in notebook order.
    pub fn cells(&self) -> impl Iterator<Item = &MemoryCell> {
        self.cells.iter()
    }
}

impl Notebook for MemoryNotebook {
    type Cell = MemoryCell;

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, index: usize) -> Option<&MemoryCell> {
        self.cells.get(index)
    }

    fn cell_mut(&mut self, index: usize) -> Option<&mut MemoryCell> {
        self.cells.get_mut(index)
    }

    fn insert_cell(&mut self, index: usize, kind: CellKind) -> &mut MemoryCell {
        let index = index.min(self.cells.len());
        self.cells.insert(index, MemoryCell::new(kind));
        &mut self.cells[index]
    }
}

/// Scripted kernel link for tests and demos.
///
/// `restart` only records the request; status transitions are driven by the
/// embedder calling [`MemoryKernel::set_status`], mirroring how the real host
/// delivers asynchronous status notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryKernel {
    status: ConnectionStatus,
    restart_requests: u32,
    /// When false, `restart` fails like a dead session would.
    pub reachable: bool,
}

impl Default for MemoryKernel {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Connected,
            restart_requests: 0,
            reachable: true,
        }
    }
}

impl MemoryKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of restarts requested through this link.
    pub fn restart_requests(&self) -> u32 {
        self.restart_requests
    }

    /// Simulates a host-side status change.
    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }
}

impl KernelLink for MemoryKernel {
    fn status(&self) -> ConnectionStatus {
        self.status
    }

    fn restart(&mut self) -> Result<(), KernelUnavailable> {
        if !self.reachable {
            return Err(KernelUnavailable("no live session".to_string()));
        }
        self.restart_requests += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryCell, MemoryKernel, MemoryNotebook};
    use crate::host::{ConnectionStatus, KernelLink, Notebook, NotebookCell};
    use crate::model::cell::CellKind;
    use serde_json::json;

    #[test]
    fn metadata_bag_supports_overwrite_and_idempotent_delete() {
        let mut cell = MemoryCell::new(CellKind::Code);
        cell.set_metadata("k", json!(1));
        cell.set_metadata("k", json!(2));
        assert_eq!(cell.metadata("k"), Some(json!(2)));

        cell.delete_metadata("k");
        cell.delete_metadata("k");
        assert_eq!(cell.metadata("k"), None);
        assert!(cell.metadata_keys().is_empty());
    }

    #[test]
    fn insert_cell_shifts_existing_cells() {
        let mut notebook = MemoryNotebook::new();
        let first = notebook.push_cell(MemoryCell::code("a = 1"));
        notebook.insert_cell(0, CellKind::Raw);

        assert_eq!(notebook.len(), 2);
        assert_eq!(notebook.cell(0).map(|c| c.kind()), Some(CellKind::Raw));
        assert_eq!(notebook.cell(1).map(|c| c.id()), Some(first));
    }

    #[test]
    fn unreachable_kernel_rejects_restart() {
        let mut kernel = MemoryKernel::new();
        kernel.reachable = false;
        assert!(kernel.restart().is_err());
        assert_eq!(kernel.restart_requests(), 0);
        assert_eq!(kernel.status(), ConnectionStatus::Connected);
    }
}
