//! Scene use-case service.
//!
//! # Responsibility
//! - Expose scene CRUD, tag toggling and the restart workflow to the UI
//!   layer, one service instance per notebook.
//! - Log every skipped operation so inconsistencies stay visible without
//!   ever failing the host.
//! - Keep cell presentation marks in sync with the active scene's tag set.
//!
//! # Invariants
//! - Store errors never escape as panics; callers may discard the `Result`
//!   and rely on the structured log alone.
//! - Scene initialization runs code cells only, in notebook order.

use crate::host::{CellExecutor, ConnectionStatus, KernelLink, Notebook, NotebookCell};
use crate::model::scene::{scene_tag_key, tag_enabled};
use crate::restart::{RestartCoordinator, RestartOutcome};
use crate::store::scene_store::{SceneInconsistency, SceneStore, StoreResult};
use log::{info, warn};

/// Per-notebook facade combining the scene store and the restart latch.
#[derive(Debug, Default)]
pub struct SceneService {
    store: SceneStore,
    coordinator: RestartCoordinator,
}

impl SceneService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow of the underlying store for read-only callers.
    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    /// Creates the data cell on first notebook-ready, then syncs marks.
    ///
    /// Returns `true` when the data cell was inserted.
    pub fn ensure_ready<N: Notebook>(&self, notebook: &mut N) -> bool {
        let created = self.store.ensure_data_cell(notebook);
        if created {
            info!("event=data_cell_created module=service status=ok");
        }
        self.refresh_scene_marks(notebook);
        created
    }

    /// Ordered scene names; empty with a log entry on inconsistency.
    pub fn scene_list<N: Notebook>(&self, notebook: &N) -> Vec<String> {
        match self.store.scene_list(notebook) {
            Ok(scenes) => scenes,
            Err(err) => {
                warn!("event=scene_list module=service status=skipped error={err}");
                Vec::new()
            }
        }
    }

    /// Active scene name; `None` with a log entry on inconsistency.
    pub fn active_scene<N: Notebook>(&self, notebook: &N) -> Option<String> {
        match self.store.active_scene(notebook) {
            Ok(scene) => Some(scene),
            Err(err) => {
                warn!("event=active_scene module=service status=skipped error={err}");
                None
            }
        }
    }

    /// Switches the active scene and re-marks cells.
    pub fn select_scene<N: Notebook>(&self, notebook: &mut N, name: &str) -> StoreResult<()> {
        let result = self.store.set_active_scene(notebook, name);
        self.after_mutation(notebook, "scene_select", name, &result);
        result
    }

    /// Creates a new empty scene and activates it.
    pub fn create_scene<N: Notebook>(&self, notebook: &mut N, name: &str) -> StoreResult<()> {
        let result = self.store.create_scene(notebook, name);
        self.after_mutation(notebook, "scene_create", name, &result);
        result
    }

    /// Duplicates the active scene's tag set under a new name.
    pub fn duplicate_scene<N: Notebook>(&self, notebook: &mut N, new_name: &str) -> StoreResult<()> {
        let result = self.store.duplicate_scene(notebook, new_name);
        self.after_mutation(notebook, "scene_duplicate", new_name, &result);
        result
    }

    /// Renames a scene, moving every cell's tag key.
    pub fn rename_scene<N: Notebook>(
        &self,
        notebook: &mut N,
        old_name: &str,
        new_name: &str,
    ) -> StoreResult<()> {
        let result = self.store.rename_scene(notebook, old_name, new_name);
        self.after_mutation(notebook, "scene_rename", new_name, &result);
        result
    }

    /// Renames the currently active scene.
    pub fn rename_present_scene<N: Notebook>(
        &self,
        notebook: &mut N,
        new_name: &str,
    ) -> StoreResult<()> {
        let active = self.store.active_scene(notebook)?;
        self.rename_scene(notebook, &active, new_name)
    }

    /// Deletes a scene; the only remaining scene is refused.
    pub fn delete_scene<N: Notebook>(&self, notebook: &mut N, name: &str) -> StoreResult<()> {
        let result = self.store.delete_scene(notebook, name);
        self.after_mutation(notebook, "scene_delete", name, &result);
        result
    }

    /// Flips one cell's membership in `scene`.
    ///
    /// Returns the new membership, or `None` when the cell index is out of
    /// range. The cell's presentation mark follows the toggle when `scene`
    /// is the active one.
    pub fn toggle_cell_tag<N: Notebook>(
        &self,
        notebook: &mut N,
        cell_index: usize,
        scene: &str,
    ) -> Option<bool> {
        let active = self.active_scene(notebook);
        let cell = notebook.cell_mut(cell_index)?;
        let tagged = self.store.toggle_cell_tag(cell, scene);
        if active.as_deref() == Some(scene) {
            cell.set_scene_marked(tagged);
        }
        info!("event=cell_tag_toggle module=service status=ok scene={scene} tagged={tagged}");
        Some(tagged)
    }

    /// Re-derives every cell's presentation mark from the active scene.
    pub fn refresh_scene_marks<N: Notebook>(&self, notebook: &mut N) {
        let Ok(active) = self.store.active_scene(notebook) else {
            return;
        };
        let key = scene_tag_key(&active);
        for index in 0..notebook.len() {
            if let Some(cell) = notebook.cell_mut(index) {
                let tagged = tag_enabled(cell.metadata(&key).as_ref());
                cell.set_scene_marked(tagged);
            }
        }
    }

    /// Runs the consistency sweep, logging each finding.
    pub fn verify<N: Notebook>(&self, notebook: &N) -> Vec<SceneInconsistency> {
        let findings = self.store.verify(notebook);
        for finding in &findings {
            warn!("event=scene_verify module=service status=warn finding={finding}");
        }
        findings
    }

    /// Arms the restart latch and asks the host to restart the kernel.
    ///
    /// On `Armed { subscribe: true }` the glue must install the connection
    /// status listener feeding [`Self::on_connection_status`]; that happens
    /// once per service instance.
    pub fn request_restart<K: KernelLink>(&mut self, kernel: Option<&mut K>) -> RestartOutcome {
        self.coordinator.request_restart(kernel)
    }

    /// Status-event handler; wire to the kernel's status stream.
    ///
    /// When the armed `connecting -> connected` transition completes, every
    /// code cell tagged for the active scene is submitted to `executor` in
    /// notebook order.
    pub fn on_connection_status<N: Notebook, E: CellExecutor>(
        &mut self,
        status: ConnectionStatus,
        notebook: &N,
        executor: &mut E,
    ) {
        if self.coordinator.on_connection_status(status) {
            self.run_active_scene(notebook, executor);
        }
    }

    fn run_active_scene<N: Notebook, E: CellExecutor>(&self, notebook: &N, executor: &mut E) {
        let scene = match self.store.active_scene(notebook) {
            Ok(scene) => scene,
            Err(err) => {
                warn!("event=scene_run module=service status=skipped error={err}");
                return;
            }
        };

        let positions = match self.store.tagged_cells(notebook, &scene) {
            Ok(positions) => positions,
            Err(err) => {
                warn!("event=scene_run module=service status=skipped scene={scene} error={err}");
                return;
            }
        };

        let mut submitted = 0usize;
        for index in positions {
            let Some(cell) = notebook.cell(index) else {
                continue;
            };
            if !cell.kind().is_executable() {
                continue;
            }
            executor.execute(cell.id());
            submitted += 1;
        }
        info!("event=scene_run module=service status=ok scene={scene} cells={submitted}");
    }

    fn after_mutation<N: Notebook>(
        &self,
        notebook: &mut N,
        operation: &str,
        name: &str,
        result: &StoreResult<()>,
    ) {
        match result {
            Ok(()) => {
                self.refresh_scene_marks(notebook);
                info!("event={operation} module=service status=ok name={name}");
            }
            Err(err) => {
                warn!("event={operation} module=service status=skipped name={name} error={err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SceneService;
    use crate::host::memory::{MemoryCell, MemoryNotebook};
    use crate::host::Notebook;
    use crate::model::scene::DEFAULT_SCENE_NAME;

    #[test]
    fn toggle_marks_cell_only_for_active_scene() {
        let service = SceneService::new();
        let mut notebook = MemoryNotebook::new();
        notebook.push_cell(MemoryCell::code("setup()"));
        service.ensure_ready(&mut notebook);
        service
            .create_scene(&mut notebook, "Other")
            .expect("create scene");

        // "Default Scene" is no longer active, so tagging for it must not
        // mark the cell.
        service
            .toggle_cell_tag(&mut notebook, 1, DEFAULT_SCENE_NAME)
            .expect("cell exists");
        assert!(!notebook.cell(1).expect("cell").scene_marked());

        service
            .toggle_cell_tag(&mut notebook, 1, "Other")
            .expect("cell exists");
        assert!(notebook.cell(1).expect("cell").scene_marked());
    }

    #[test]
    fn select_scene_rederives_marks() {
        let service = SceneService::new();
        let mut notebook = MemoryNotebook::new();
        notebook.push_cell(MemoryCell::code("a()"));
        notebook.push_cell(MemoryCell::code("b()"));
        service.ensure_ready(&mut notebook);
        service.create_scene(&mut notebook, "B").expect("create");

        service.toggle_cell_tag(&mut notebook, 1, DEFAULT_SCENE_NAME);
        service.toggle_cell_tag(&mut notebook, 2, "B");
        assert!(notebook.cell(2).expect("cell").scene_marked());

        service
            .select_scene(&mut notebook, DEFAULT_SCENE_NAME)
            .expect("select");
        assert!(notebook.cell(1).expect("cell").scene_marked());
        assert!(!notebook.cell(2).expect("cell").scene_marked());
    }
}
