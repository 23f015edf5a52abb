//! Core logic for scene-based notebook reinitialization.
//!
//! Cells are tagged as members of named "initialization scenes"; a kernel
//! restart is followed by automatic execution of every code cell tagged for
//! the active scene. This crate is the single source of truth for the scene
//! metadata invariants and the restart-sequencing latch; all UI wiring and
//! the notebook/kernel platform stay behind the [`host`] trait seams.

pub mod host;
pub mod logging;
pub mod model;
pub mod restart;
pub mod service;
pub mod store;

pub use host::{CellExecutor, ConnectionStatus, KernelLink, KernelUnavailable, Notebook, NotebookCell};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::cell::{CellId, CellKind};
pub use model::scene::{
    scene_from_tag_key, scene_tag_key, SceneDataError, SceneRecord, DEFAULT_SCENE_NAME,
    PRESENT_SCENE_KEY, REINIT_DATA_KEY, SCENES_KEY, SCENE_TAG_PREFIX,
};
pub use restart::{RestartCoordinator, RestartOutcome, RestartStage};
pub use service::scene_service::SceneService;
pub use store::scene_store::{SceneInconsistency, SceneStore, SceneStoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
