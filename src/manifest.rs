// manifest.rs — 场景清单
//
// { "start": "lobby", "scenes": { "lobby": { "title": "Lobby", "path": "scenes/lobby" } } }

use crate::error::{Result, ViewerError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SceneEntry {
    pub title: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub start: String,
    pub scenes: BTreeMap<String, SceneEntry>,
    /// Directory scene paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ViewerError::ManifestLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json(&text, base_dir).map_err(|e| match e {
            ViewerError::ManifestLoad { reason, .. } => ViewerError::ManifestLoad {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_json(text: &str, base_dir: PathBuf) -> Result<Self> {
        let mut manifest: Manifest =
            serde_json::from_str(text).map_err(|e| ViewerError::ManifestLoad {
                path: PathBuf::new(),
                reason: e.to_string(),
            })?;
        if !manifest.scenes.contains_key(&manifest.start) {
            return Err(ViewerError::ManifestLoad {
                path: PathBuf::new(),
                reason: format!("start scene `{}` is not listed in scenes", manifest.start),
            });
        }
        manifest.base_dir = base_dir;
        Ok(manifest)
    }

    pub fn scene(&self, name: &str) -> Result<&SceneEntry> {
        self.scenes
            .get(name)
            .ok_or_else(|| ViewerError::SceneNotFound(name.to_string()))
    }

    pub fn scene_dir(&self, entry: &SceneEntry) -> PathBuf {
        self.base_dir.join(&entry.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOBBY: &str = r#"{
        "start": "lobby",
        "scenes": { "lobby": { "title": "Lobby", "path": "scenes/lobby" } }
    }"#;

    #[test]
    fn parses_start_and_scenes() {
        let m = Manifest::from_json(LOBBY, PathBuf::from("/data")).unwrap();
        assert_eq!(m.start, "lobby");
        let entry = m.scene("lobby").unwrap();
        assert_eq!(entry.title, "Lobby");
        assert_eq!(m.scene_dir(entry), PathBuf::from("/data/scenes/lobby"));
    }

    #[test]
    fn unknown_scene_is_scene_not_found() {
        let m = Manifest::from_json(LOBBY, PathBuf::new()).unwrap();
        assert!(matches!(m.scene("hall"), Err(ViewerError::SceneNotFound(name)) if name == "hall"));
    }

    #[test]
    fn start_must_name_a_scene() {
        let text = r#"{ "start": "attic", "scenes": {} }"#;
        assert!(matches!(
            Manifest::from_json(text, PathBuf::new()),
            Err(ViewerError::ManifestLoad { .. })
        ));
    }

    #[test]
    fn missing_file_is_manifest_failure() {
        let err = Manifest::load(Path::new("/nonexistent/scenes.json")).unwrap_err();
        assert!(matches!(err, ViewerError::ManifestLoad { path, .. } if path.ends_with("scenes.json")));
    }
}
