//! Scene record and persisted metadata key schema.
//!
//! # Responsibility
//! - Define the typed record behind the data cell's metadata entries.
//! - Translate between that record and the host's generic JSON metadata.
//! - Own the `init_scene__<name>` tag-key format and its recognizer.
//!
//! # Invariants
//! - `scenes` is insertion-ordered, duplicate-free and non-empty once read.
//! - `present_scene` is always a member of `scenes` after translation; a
//!   stored non-member value is defaulted to the first entry and surfaced
//!   through [`PresentSceneSource::Defaulted`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Marker key identifying the reserved data cell.
pub const REINIT_DATA_KEY: &str = "reinit_data";
/// Data cell key holding the ordered scene name list.
pub const SCENES_KEY: &str = "scenes";
/// Data cell key holding the active scene name.
pub const PRESENT_SCENE_KEY: &str = "present_scene";
/// Prefix of per-cell scene membership tag keys.
pub const SCENE_TAG_PREFIX: &str = "init_scene__";
/// Scene name seeded into a freshly created data cell.
pub const DEFAULT_SCENE_NAME: &str = "Default Scene";

static SCENE_TAG_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^init_scene__(.+)$").expect("valid scene tag regex"));

/// Builds the metadata key tagging a cell for `scene`.
pub fn scene_tag_key(scene: &str) -> String {
    format!("{SCENE_TAG_PREFIX}{scene}")
}

/// Extracts the scene name from a tag key, or `None` for unrelated keys.
pub fn scene_from_tag_key(key: &str) -> Option<&str> {
    SCENE_TAG_KEY_RE
        .captures(key)
        .and_then(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Returns whether a metadata value marks an enabled tag.
///
/// Absent keys and non-`true` values both mean "untagged", so notebooks
/// written by variants that stored `false` instead of deleting the key still
/// round-trip.
pub fn tag_enabled(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

/// Where the resolved `present_scene` value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentSceneSource {
    /// The stored value was a valid member of the scene list.
    Stored,
    /// The stored value was absent or not a member; first entry substituted.
    Defaulted,
}

/// Malformed or inconsistent data cell metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneDataError {
    /// `scenes` key absent from the data cell.
    ScenesMissing,
    /// `scenes` exists but is not an array of strings.
    ScenesMalformed(String),
    /// `scenes` is an empty array.
    SceneListEmpty,
    /// `scenes` contains the same name more than once.
    DuplicateSceneName(String),
}

impl Display for SceneDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScenesMissing => write!(f, "data cell has no `{SCENES_KEY}` entry"),
            Self::ScenesMalformed(details) => {
                write!(f, "`{SCENES_KEY}` is not a string array: {details}")
            }
            Self::SceneListEmpty => write!(f, "scene list is empty"),
            Self::DuplicateSceneName(name) => {
                write!(f, "scene list contains `{name}` more than once")
            }
        }
    }
}

impl Error for SceneDataError {}

/// Typed projection of the data cell's scene metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Ordered, duplicate-free scene names. Insertion order is display order.
    pub scenes: Vec<String>,
    /// Active scene; always a member of `scenes`.
    pub present_scene: String,
}

impl SceneRecord {
    /// Record seeded into a freshly created data cell.
    pub fn initial() -> Self {
        Self {
            scenes: vec![DEFAULT_SCENE_NAME.to_string()],
            present_scene: DEFAULT_SCENE_NAME.to_string(),
        }
    }

    /// Translates raw metadata values into a typed record.
    ///
    /// `present_scene` falls back to the first scene when the stored value is
    /// absent or not a member of the list; the caller learns about the
    /// substitution through the returned [`PresentSceneSource`].
    pub fn from_values(
        scenes: Option<&Value>,
        present_scene: Option<&Value>,
    ) -> Result<(Self, PresentSceneSource), SceneDataError> {
        let scenes = parse_scene_list(scenes)?;

        let stored = present_scene.and_then(Value::as_str);
        let (present_scene, source) = match stored {
            Some(name) if scenes.iter().any(|scene| scene == name) => {
                (name.to_string(), PresentSceneSource::Stored)
            }
            _ => (scenes[0].clone(), PresentSceneSource::Defaulted),
        };

        Ok((
            Self {
                scenes,
                present_scene,
            },
            source,
        ))
    }

    /// Metadata value for the `scenes` key.
    pub fn scenes_value(&self) -> Value {
        Value::Array(
            self.scenes
                .iter()
                .map(|name| Value::String(name.clone()))
                .collect(),
        )
    }

    /// Metadata value for the `present_scene` key.
    pub fn present_scene_value(&self) -> Value {
        Value::String(self.present_scene.clone())
    }

    /// Returns whether `name` is a listed scene.
    pub fn contains(&self, name: &str) -> bool {
        self.scenes.iter().any(|scene| scene == name)
    }
}

fn parse_scene_list(value: Option<&Value>) -> Result<Vec<String>, SceneDataError> {
    let raw = match value {
        Some(Value::Array(items)) => items,
        Some(other) => return Err(SceneDataError::ScenesMalformed(other.to_string())),
        None => return Err(SceneDataError::ScenesMissing),
    };

    let mut scenes = Vec::with_capacity(raw.len());
    for item in raw {
        let name = item
            .as_str()
            .ok_or_else(|| SceneDataError::ScenesMalformed(item.to_string()))?;
        if scenes.iter().any(|existing: &String| existing == name) {
            return Err(SceneDataError::DuplicateSceneName(name.to_string()));
        }
        scenes.push(name.to_string());
    }

    if scenes.is_empty() {
        return Err(SceneDataError::SceneListEmpty);
    }

    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use super::{
        scene_from_tag_key, scene_tag_key, tag_enabled, PresentSceneSource, SceneDataError,
        SceneRecord,
    };
    use serde_json::{json, Value};

    #[test]
    fn tag_key_round_trips_scene_name() {
        let key = scene_tag_key("GPU warmup");
        assert_eq!(key, "init_scene__GPU warmup");
        assert_eq!(scene_from_tag_key(&key), Some("GPU warmup"));
    }

    #[test]
    fn tag_key_recognizer_rejects_unrelated_keys() {
        assert_eq!(scene_from_tag_key("collapsed"), None);
        assert_eq!(scene_from_tag_key("init_scene__"), None);
        assert_eq!(scene_from_tag_key("reinit_data"), None);
    }

    #[test]
    fn tag_enabled_requires_literal_true() {
        assert!(tag_enabled(Some(&Value::Bool(true))));
        assert!(!tag_enabled(Some(&Value::Bool(false))));
        assert!(!tag_enabled(Some(&json!("true"))));
        assert!(!tag_enabled(None));
    }

    #[test]
    fn from_values_keeps_stored_member_present_scene() {
        let scenes = json!(["A", "B"]);
        let present = json!("B");
        let (record, source) = SceneRecord::from_values(Some(&scenes), Some(&present))
            .expect("valid scene metadata");
        assert_eq!(record.present_scene, "B");
        assert_eq!(source, PresentSceneSource::Stored);
    }

    #[test]
    fn from_values_defaults_non_member_present_scene_to_first() {
        let scenes = json!(["A", "B"]);
        let present = json!("gone");
        let (record, source) = SceneRecord::from_values(Some(&scenes), Some(&present))
            .expect("valid scene metadata");
        assert_eq!(record.present_scene, "A");
        assert_eq!(source, PresentSceneSource::Defaulted);
    }

    #[test]
    fn from_values_rejects_empty_and_duplicate_lists() {
        let empty = json!([]);
        assert_eq!(
            SceneRecord::from_values(Some(&empty), None).unwrap_err(),
            SceneDataError::SceneListEmpty
        );

        let duplicated = json!(["A", "A"]);
        assert_eq!(
            SceneRecord::from_values(Some(&duplicated), None).unwrap_err(),
            SceneDataError::DuplicateSceneName("A".to_string())
        );
    }

    #[test]
    fn metadata_values_stay_byte_compatible() {
        let record = SceneRecord {
            scenes: vec!["A".to_string(), "B".to_string()],
            present_scene: "B".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&record.scenes_value()).expect("serializable"),
            r#"["A","B"]"#
        );
        assert_eq!(
            serde_json::to_string(&record.present_scene_value()).expect("serializable"),
            r#""B""#
        );
    }
}
