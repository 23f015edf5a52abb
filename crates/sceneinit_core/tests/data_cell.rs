use sceneinit_core::host::memory::{MemoryCell, MemoryNotebook};
use sceneinit_core::{
    CellKind, Notebook, NotebookCell, SceneInconsistency, SceneService, SceneStore,
    DEFAULT_SCENE_NAME, PRESENT_SCENE_KEY, REINIT_DATA_KEY, SCENES_KEY,
};
use serde_json::json;

#[test]
fn data_cell_is_created_lazily_at_index_zero() {
    let store = SceneStore::new();
    let mut notebook = MemoryNotebook::new();
    notebook.push_cell(MemoryCell::code("first_user_cell()"));

    assert!(!store.has_data_cell(&notebook));
    assert!(store.ensure_data_cell(&mut notebook));
    assert!(store.has_data_cell(&notebook));

    let data_cell = notebook.cell(0).unwrap();
    assert_eq!(data_cell.kind(), CellKind::Raw);
    assert_eq!(data_cell.metadata(REINIT_DATA_KEY), Some(json!(true)));
    assert_eq!(data_cell.metadata(SCENES_KEY), Some(json!([DEFAULT_SCENE_NAME])));
    assert_eq!(
        data_cell.metadata(PRESENT_SCENE_KEY),
        Some(json!(DEFAULT_SCENE_NAME))
    );
}

#[test]
fn ensure_data_cell_never_inserts_twice() {
    let store = SceneStore::new();
    let mut notebook = MemoryNotebook::new();
    assert!(store.ensure_data_cell(&mut notebook));
    assert!(!store.ensure_data_cell(&mut notebook));
    assert!(!store.ensure_data_cell(&mut notebook));
    assert_eq!(notebook.len(), 1);
}

#[test]
fn persisted_schema_round_trips_through_json() {
    let store = SceneStore::new();
    let mut notebook = MemoryNotebook::new();
    notebook.push_cell(MemoryCell::code("x = 1"));
    store.ensure_data_cell(&mut notebook);
    store.create_scene(&mut notebook, "GPU").unwrap();
    store.toggle_cell_tag(notebook.cell_mut(1).unwrap(), "GPU");

    // Serialize the metadata the way the notebook document would persist it,
    // then read it back through a rebuilt notebook.
    let mut restored = MemoryNotebook::new();
    for index in 0..notebook.len() {
        let cell = notebook.cell(index).unwrap();
        let mut copy = MemoryCell::new(cell.kind());
        for key in cell.metadata_keys() {
            let value = cell.metadata(&key).unwrap();
            let wire = serde_json::to_string(&value).unwrap();
            copy.set_metadata(&key, serde_json::from_str(&wire).unwrap());
        }
        restored.push_cell(copy);
    }

    assert!(store.has_data_cell(&restored));
    assert_eq!(
        store.scene_list(&restored).unwrap(),
        vec![DEFAULT_SCENE_NAME.to_string(), "GPU".to_string()]
    );
    assert_eq!(store.active_scene(&restored).unwrap(), "GPU");
    assert_eq!(store.tagged_cells(&restored, "GPU").unwrap(), vec![1]);
}

#[test]
fn stale_present_scene_falls_back_to_first_entry() {
    let store = SceneStore::new();
    let mut notebook = MemoryNotebook::new();
    store.ensure_data_cell(&mut notebook);
    store.create_scene(&mut notebook, "Extra").unwrap();

    // Simulate an externally edited notebook pointing at a removed scene.
    notebook
        .cell_mut(0)
        .unwrap()
        .set_metadata(PRESENT_SCENE_KEY, json!("removed"));

    assert_eq!(store.active_scene(&notebook).unwrap(), DEFAULT_SCENE_NAME);
}

#[test]
fn service_verify_surfaces_every_finding() {
    let service = SceneService::new();
    let mut notebook = MemoryNotebook::new();
    notebook.push_cell(MemoryCell::code("y = 2"));

    assert_eq!(
        service.verify(&notebook),
        vec![SceneInconsistency::DataCellMissing]
    );

    service.ensure_ready(&mut notebook);
    assert!(service.verify(&notebook).is_empty());

    notebook
        .cell_mut(1)
        .unwrap()
        .set_metadata("init_scene__phantom", json!(true));
    let findings = service.verify(&notebook);
    assert_eq!(findings.len(), 1);
    assert!(matches!(
        &findings[0],
        SceneInconsistency::OrphanTag { cell_index: 1, scene } if scene == "phantom"
    ));
}
