//! Scene store: CRUD over the data cell and per-cell scene tags.
//!
//! # Responsibility
//! - Own the scene list, the active-scene pointer and cell membership tags.
//! - Keep scene metadata consistent across create/duplicate/rename/delete.
//!
//! # Invariants
//! - The data cell lives at index 0 once created and is created at most once.
//! - The scene list stays duplicate-free and non-empty after initialization.
//! - The active scene is always a member of the list after any operation.
//! - Rename/delete rewrite tag keys atomically per cell, best-effort across
//!   cells; there is no cross-cell transaction.

use crate::host::{Notebook, NotebookCell};
use crate::model::cell::CellKind;
use crate::model::scene::{
    scene_from_tag_key, scene_tag_key, tag_enabled, PresentSceneSource, SceneDataError,
    SceneRecord, PRESENT_SCENE_KEY, REINIT_DATA_KEY, SCENES_KEY,
};
use log::warn;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, SceneStoreError>;

/// Scene store operation errors.
///
/// Every variant is a reported-and-skipped condition for the UI layer; none
/// of them may take the host down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneStoreError {
    /// Cell 0 is absent or lacks the `reinit_data` marker.
    DataCellMissing,
    /// Data cell metadata is malformed.
    Data(SceneDataError),
    /// Named scene is not in the scene list.
    UnknownScene(String),
    /// Scene name is already in the scene list.
    DuplicateScene(String),
    /// Refusing to delete the only remaining scene.
    LastScene(String),
}

impl Display for SceneStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataCellMissing => write!(f, "notebook has no scene data cell"),
            Self::Data(err) => write!(f, "{err}"),
            Self::UnknownScene(name) => write!(f, "unknown scene: `{name}`"),
            Self::DuplicateScene(name) => write!(f, "scene already exists: `{name}`"),
            Self::LastScene(name) => {
                write!(f, "refusing to delete the only scene: `{name}`")
            }
        }
    }
}

impl Error for SceneStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Data(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SceneDataError> for SceneStoreError {
    fn from(value: SceneDataError) -> Self {
        Self::Data(value)
    }
}

/// Inconsistency found by [`SceneStore::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneInconsistency {
    /// No data cell marker at index 0.
    DataCellMissing,
    /// Data cell metadata failed typed translation.
    Data(SceneDataError),
    /// Stored `present_scene` is not a member of the scene list.
    PresentSceneNotListed { stored: String, fallback: String },
    /// A cell carries a tag for a scene the list does not know.
    OrphanTag { cell_index: usize, scene: String },
}

impl Display for SceneInconsistency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataCellMissing => write!(f, "notebook has no scene data cell"),
            Self::Data(err) => write!(f, "{err}"),
            Self::PresentSceneNotListed { stored, fallback } => write!(
                f,
                "present scene `{stored}` is not listed; falling back to `{fallback}`"
            ),
            Self::OrphanTag { cell_index, scene } => {
                write!(f, "cell {cell_index} is tagged for unlisted scene `{scene}`")
            }
        }
    }
}

/// Sole owner of scene list, active-scene pointer and per-cell tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct SceneStore;

impl SceneStore {
    pub fn new() -> Self {
        Self
    }

    /// Lazily creates the reserved data cell at index 0.
    ///
    /// Returns `true` when a cell was inserted, `false` when the notebook
    /// already had one. Safe to call on every notebook-ready event.
    pub fn ensure_data_cell<N: Notebook>(&self, notebook: &mut N) -> bool {
        if self.has_data_cell(notebook) {
            return false;
        }

        let cell = notebook.insert_cell(0, CellKind::Raw);
        cell.set_metadata(REINIT_DATA_KEY, Value::Bool(true));
        write_record_to(cell, &SceneRecord::initial());
        true
    }

    /// Returns whether the notebook carries the marker cell at index 0.
    pub fn has_data_cell<N: Notebook>(&self, notebook: &N) -> bool {
        notebook
            .cell(0)
            .is_some_and(|cell| tag_enabled(cell.metadata(REINIT_DATA_KEY).as_ref()))
    }

    /// Ordered scene names from the data cell.
    pub fn scene_list<N: Notebook>(&self, notebook: &N) -> StoreResult<Vec<String>> {
        Ok(self.read_record(notebook)?.scenes)
    }

    /// The scene selected for the next restart-triggered run.
    ///
    /// A stored non-member value falls back to the first listed scene; the
    /// substitution is reported through the log, not an error.
    pub fn active_scene<N: Notebook>(&self, notebook: &N) -> StoreResult<String> {
        Ok(self.read_record(notebook)?.present_scene)
    }

    /// Selects the active scene.
    ///
    /// A name outside the scene list is rejected without touching state.
    pub fn set_active_scene<N: Notebook>(&self, notebook: &mut N, name: &str) -> StoreResult<()> {
        let mut record = self.read_record(notebook)?;
        if !record.contains(name) {
            return Err(SceneStoreError::UnknownScene(name.to_string()));
        }
        record.present_scene = name.to_string();
        self.write_record(notebook, &record)
    }

    /// Appends a new empty scene and makes it active.
    pub fn create_scene<N: Notebook>(&self, notebook: &mut N, name: &str) -> StoreResult<()> {
        let mut record = self.read_record(notebook)?;
        if record.contains(name) {
            return Err(SceneStoreError::DuplicateScene(name.to_string()));
        }
        record.scenes.push(name.to_string());
        record.present_scene = name.to_string();
        self.write_record(notebook, &record)
    }

    /// Appends `new_name` with a copy of the active scene's tag set and makes
    /// it active.
    pub fn duplicate_scene<N: Notebook>(
        &self,
        notebook: &mut N,
        new_name: &str,
    ) -> StoreResult<()> {
        let mut record = self.read_record(notebook)?;
        if record.contains(new_name) {
            return Err(SceneStoreError::DuplicateScene(new_name.to_string()));
        }

        let source_key = scene_tag_key(&record.present_scene);
        let target_key = scene_tag_key(new_name);
        for index in 0..notebook.len() {
            let Some(cell) = notebook.cell_mut(index) else {
                continue;
            };
            if tag_enabled(cell.metadata(&source_key).as_ref()) {
                cell.set_metadata(&target_key, Value::Bool(true));
            }
        }

        record.scenes.push(new_name.to_string());
        record.present_scene = new_name.to_string();
        self.write_record(notebook, &record)
    }

    /// Renames a scene in place and moves every cell's tag key with it.
    pub fn rename_scene<N: Notebook>(
        &self,
        notebook: &mut N,
        old_name: &str,
        new_name: &str,
    ) -> StoreResult<()> {
        if old_name == new_name {
            return Ok(());
        }

        let mut record = self.read_record(notebook)?;
        let Some(position) = record.scenes.iter().position(|scene| scene == old_name) else {
            return Err(SceneStoreError::UnknownScene(old_name.to_string()));
        };
        if record.contains(new_name) {
            return Err(SceneStoreError::DuplicateScene(new_name.to_string()));
        }

        let old_key = scene_tag_key(old_name);
        let new_key = scene_tag_key(new_name);
        for index in 0..notebook.len() {
            let Some(cell) = notebook.cell_mut(index) else {
                continue;
            };
            if let Some(value) = cell.metadata(&old_key) {
                cell.set_metadata(&new_key, value);
                cell.delete_metadata(&old_key);
            }
        }

        record.scenes[position] = new_name.to_string();
        record.present_scene = new_name.to_string();
        self.write_record(notebook, &record)
    }

    /// Removes a scene, strips its tags and activates the new first entry.
    ///
    /// Deleting the only remaining scene is rejected to keep the at-least-one
    /// invariant.
    pub fn delete_scene<N: Notebook>(&self, notebook: &mut N, name: &str) -> StoreResult<()> {
        let mut record = self.read_record(notebook)?;
        if !record.contains(name) {
            return Err(SceneStoreError::UnknownScene(name.to_string()));
        }
        if record.scenes.len() == 1 {
            return Err(SceneStoreError::LastScene(name.to_string()));
        }

        let key = scene_tag_key(name);
        for index in 0..notebook.len() {
            if let Some(cell) = notebook.cell_mut(index) {
                cell.delete_metadata(&key);
            }
        }

        record.scenes.retain(|scene| scene != name);
        record.present_scene = record.scenes[0].clone();
        self.write_record(notebook, &record)
    }

    /// Flips one cell's membership in `scene` and returns the new value.
    ///
    /// Enabling writes `true`; disabling removes the key so untagged cells
    /// carry no scene metadata at all.
    pub fn toggle_cell_tag<C: NotebookCell>(&self, cell: &mut C, scene: &str) -> bool {
        let key = scene_tag_key(scene);
        let now_tagged = !tag_enabled(cell.metadata(&key).as_ref());
        if now_tagged {
            cell.set_metadata(&key, Value::Bool(true));
        } else {
            cell.delete_metadata(&key);
        }
        now_tagged
    }

    /// Notebook-ordered positions of all cells tagged for `scene`.
    pub fn tagged_cells<N: Notebook>(&self, notebook: &N, scene: &str) -> StoreResult<Vec<usize>> {
        // Read the record first so a missing data cell is reported instead of
        // silently yielding an empty run set.
        self.read_record(notebook)?;

        let key = scene_tag_key(scene);
        let mut positions = Vec::new();
        for index in 0..notebook.len() {
            let Some(cell) = notebook.cell(index) else {
                continue;
            };
            if tag_enabled(cell.metadata(&key).as_ref()) {
                positions.push(index);
            }
        }
        Ok(positions)
    }

    /// Non-mutating consistency sweep over scene metadata.
    pub fn verify<N: Notebook>(&self, notebook: &N) -> Vec<SceneInconsistency> {
        let mut findings = Vec::new();

        if !self.has_data_cell(notebook) {
            findings.push(SceneInconsistency::DataCellMissing);
            return findings;
        }

        let data_cell = match notebook.cell(0) {
            Some(cell) => cell,
            None => {
                findings.push(SceneInconsistency::DataCellMissing);
                return findings;
            }
        };

        let scenes = data_cell.metadata(SCENES_KEY);
        let present = data_cell.metadata(PRESENT_SCENE_KEY);
        let record = match SceneRecord::from_values(scenes.as_ref(), present.as_ref()) {
            Ok((record, source)) => {
                if source == PresentSceneSource::Defaulted {
                    findings.push(SceneInconsistency::PresentSceneNotListed {
                        stored: present
                            .as_ref()
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        fallback: record.present_scene.clone(),
                    });
                }
                record
            }
            Err(err) => {
                findings.push(SceneInconsistency::Data(err));
                return findings;
            }
        };

        for index in 0..notebook.len() {
            let Some(cell) = notebook.cell(index) else {
                continue;
            };
            for key in cell.metadata_keys() {
                if let Some(scene) = scene_from_tag_key(&key) {
                    if !record.contains(scene) {
                        findings.push(SceneInconsistency::OrphanTag {
                            cell_index: index,
                            scene: scene.to_string(),
                        });
                    }
                }
            }
        }

        findings
    }

    fn read_record<N: Notebook>(&self, notebook: &N) -> StoreResult<SceneRecord> {
        if !self.has_data_cell(notebook) {
            return Err(SceneStoreError::DataCellMissing);
        }
        let cell = notebook.cell(0).ok_or(SceneStoreError::DataCellMissing)?;
        let scenes = cell.metadata(SCENES_KEY);
        let present = cell.metadata(PRESENT_SCENE_KEY);
        let (record, source) = SceneRecord::from_values(scenes.as_ref(), present.as_ref())?;
        if source == PresentSceneSource::Defaulted {
            warn!(
                "event=present_scene_defaulted module=store status=warn fallback={}",
                record.present_scene
            );
        }
        Ok(record)
    }

    fn write_record<N: Notebook>(&self, notebook: &mut N, record: &SceneRecord) -> StoreResult<()> {
        let cell = notebook
            .cell_mut(0)
            .ok_or(SceneStoreError::DataCellMissing)?;
        write_record_to(cell, record);
        Ok(())
    }
}

fn write_record_to<C: NotebookCell>(cell: &mut C, record: &SceneRecord) {
    cell.set_metadata(SCENES_KEY, record.scenes_value());
    cell.set_metadata(PRESENT_SCENE_KEY, record.present_scene_value());
}
