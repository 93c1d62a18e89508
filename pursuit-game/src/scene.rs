//! Arena layouts that training rotates through.
use serde::{Deserialize, Serialize};

use crate::constants::{ARENA_HALF_EXTENT, CHASER_SPAWN, EVADER_SPAWN};
use crate::contact::ArenaBounds;
use crate::numbers::{u32_to_usize, usize_to_u32_saturating};
use crate::patrol::PatrolSpawn;
use crate::progression::ProgressionError;
use crate::vector::Vec2;

const DEFAULT_SCENES_DATA: &str = include_str!("../data/scenes.json");

/// One arena configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub bounds: ArenaBounds,
    #[serde(default = "Scene::default_chaser_spawn")]
    pub chaser_spawn: Vec2,
    #[serde(default = "Scene::default_evader_spawn")]
    pub evader_spawn: Vec2,
    #[serde(default)]
    pub patrols: Vec<PatrolSpawn>,
}

impl Scene {
    fn default_chaser_spawn() -> Vec2 {
        Vec2::from(CHASER_SPAWN)
    }

    fn default_evader_spawn() -> Vec2 {
        Vec2::from(EVADER_SPAWN)
    }

    /// Empty square arena with the stock spawns.
    #[must_use]
    pub fn open_arena(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: ArenaBounds::square(ARENA_HALF_EXTENT),
            chaser_spawn: Self::default_chaser_spawn(),
            evader_spawn: Self::default_evader_spawn(),
            patrols: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SceneFile {
    scenes: Vec<Scene>,
}

/// Ordered, non-empty scene list.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCatalog {
    scenes: Vec<Scene>,
}

impl SceneCatalog {
    /// # Errors
    ///
    /// Returns [`ProgressionError::NoScenes`] for an empty list.
    pub fn new(scenes: Vec<Scene>) -> Result<Self, ProgressionError> {
        if scenes.is_empty() {
            return Err(ProgressionError::NoScenes);
        }
        Ok(Self { scenes })
    }

    /// Parse a `{ "scenes": [...] }` document.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed or lists no scenes.
    pub fn from_json(json: &str) -> Result<Self, ProgressionError> {
        let file: SceneFile = serde_json::from_str(json)
            .map_err(|err| ProgressionError::InvalidCatalog(err.to_string()))?;
        Self::new(file.scenes)
    }

    /// The embedded catalog, or a single open arena when it cannot be parsed.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_SCENES_DATA).unwrap_or_else(|err| {
            log::warn!("embedded scene catalog is invalid ({err}); using a single open arena");
            Self {
                scenes: vec![Scene::open_arena("Scene 1")],
            }
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene count as stored in progression records.
    #[must_use]
    pub fn count(&self) -> u32 {
        usize_to_u32_saturating(self.scenes.len())
    }

    #[must_use]
    pub fn get(&self, index: u32) -> Option<&Scene> {
        self.scenes.get(u32_to_usize(index))
    }

    /// Out-of-range indices resolve to the last scene.
    #[must_use]
    pub fn get_clamped(&self, index: u32) -> &Scene {
        let last = self.scenes.len() - 1;
        &self.scenes[u32_to_usize(index).min(last)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.scenes.iter().map(|scene| scene.name.as_str()).collect()
    }
}

impl Default for SceneCatalog {
    fn default() -> Self {
        Self::load_from_static()
    }
}
