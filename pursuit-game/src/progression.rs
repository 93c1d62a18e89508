//! Persistent scene rotation: episode counters that survive restarts and
//! decide which scene the next episode runs in.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::agent::Role;
use crate::constants::{DEFAULT_FIXED_SCENE, EPISODES_PER_SCENE, RECORD_FILE_NAME};
use crate::episode::EpisodeOutcome;
use crate::numbers::u64_to_u32_saturating;
use crate::scene::{Scene, SceneCatalog};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("scene list is empty; at least one scene is required")]
    NoScenes,
    #[error("episodes_per_scene must be at least 1")]
    ZeroEpisodesPerScene,
    #[error("scene catalog is invalid: {0}")]
    InvalidCatalog(String),
    #[error("rotation is configured for {expected} scenes but the catalog has {found}")]
    SceneCountMismatch { expected: u32, found: u32 },
}

#[derive(Debug, Error)]
pub enum RecordStorageError {
    #[error("record storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("record is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// The persisted counters. Field names match the on-disk JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneRotationRecord {
    pub total_episodes: u64,
    pub current_scene_index: u32,
    pub chaser_wins: u64,
    pub evader_wins: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Move to the next scene every `episodes_per_scene` episodes.
    #[default]
    Progressive,
    /// Stay on `fixed_scene_index` forever.
    FixedScene,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    #[serde(default)]
    pub mode: RotationMode,
    #[serde(default = "RotationSettings::default_fixed_scene_index")]
    pub fixed_scene_index: u32,
    #[serde(default = "RotationSettings::default_episodes_per_scene")]
    pub episodes_per_scene: u64,
    pub scene_count: u32,
}

impl RotationSettings {
    const fn default_fixed_scene_index() -> u32 {
        DEFAULT_FIXED_SCENE
    }

    const fn default_episodes_per_scene() -> u64 {
        EPISODES_PER_SCENE
    }

    #[must_use]
    pub const fn progressive(scene_count: u32) -> Self {
        Self {
            mode: RotationMode::Progressive,
            fixed_scene_index: Self::default_fixed_scene_index(),
            episodes_per_scene: Self::default_episodes_per_scene(),
            scene_count,
        }
    }

    #[must_use]
    pub const fn fixed(scene_count: u32, fixed_scene_index: u32) -> Self {
        Self {
            mode: RotationMode::FixedScene,
            fixed_scene_index,
            episodes_per_scene: Self::default_episodes_per_scene(),
            scene_count,
        }
    }

    #[must_use]
    pub const fn with_episodes_per_scene(mut self, episodes_per_scene: u64) -> Self {
        self.episodes_per_scene = episodes_per_scene;
        self
    }

    /// Progressive settings sized to `catalog`.
    #[must_use]
    pub fn for_catalog(catalog: &SceneCatalog) -> Self {
        Self::progressive(catalog.count())
    }

    /// # Errors
    ///
    /// Zero scenes or zero episodes per scene.
    pub fn validate(&self) -> Result<(), ProgressionError> {
        if self.scene_count == 0 {
            return Err(ProgressionError::NoScenes);
        }
        if self.episodes_per_scene == 0 {
            return Err(ProgressionError::ZeroEpisodesPerScene);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Fails when `catalog` holds a different number of scenes.
    pub fn validate_against(&self, catalog: &SceneCatalog) -> Result<(), ProgressionError> {
        self.validate()?;
        let found = catalog.count();
        if found != self.scene_count {
            return Err(ProgressionError::SceneCountMismatch {
                expected: self.scene_count,
                found,
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn clamp_index(&self, index: u32) -> u32 {
        let last = self.scene_count.saturating_sub(1);
        if index > last { last } else { index }
    }

    /// Scene a record with `total_episodes` finished episodes belongs in.
    #[must_use]
    pub fn target_index(&self, total_episodes: u64) -> u32 {
        match self.mode {
            RotationMode::FixedScene => self.clamp_index(self.fixed_scene_index),
            RotationMode::Progressive => {
                let per_scene = self.episodes_per_scene.max(1);
                self.clamp_index(u64_to_u32_saturating(total_episodes / per_scene))
            }
        }
    }
}

/// Result of counting one finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneAdvance {
    pub record: SceneRotationRecord,
    pub scene_changed: bool,
    pub new_scene_index: u32,
}

/// Count one finished episode and work out which scene comes next.
#[must_use]
pub fn record_episode_end(
    record: SceneRotationRecord,
    outcome: EpisodeOutcome,
    settings: &RotationSettings,
) -> SceneAdvance {
    let mut next = record;
    next.total_episodes = next.total_episodes.saturating_add(1);
    match outcome.winner() {
        Some(Role::Chaser) => next.chaser_wins = next.chaser_wins.saturating_add(1),
        Some(Role::Evader) => next.evader_wins = next.evader_wins.saturating_add(1),
        None => {}
    }

    let previous = settings.clamp_index(record.current_scene_index);
    let target = match settings.mode {
        RotationMode::FixedScene => previous,
        RotationMode::Progressive => settings.target_index(next.total_episodes),
    };
    next.current_scene_index = target;
    SceneAdvance {
        record: next,
        scene_changed: target != previous,
        new_scene_index: target,
    }
}

/// Where a [`SceneRotationRecord`] lives between runs.
pub trait RecordStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the stored record. `Ok(None)` means nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if stored data exists but cannot be read or parsed.
    fn load_record(&self) -> Result<Option<SceneRotationRecord>, Self::Error>;

    /// Replace the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save_record(&self, record: &SceneRotationRecord) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Returns an error if stored data exists but cannot be removed.
    fn delete_record(&self) -> Result<(), Self::Error>;
}

/// Pretty JSON file, replaced atomically on every save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecordStorage {
    path: PathBuf,
}

impl FileRecordStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `SceneRotationData.json` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(RECORD_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl RecordStorage for FileRecordStorage {
    type Error = RecordStorageError;

    fn load_record(&self) -> Result<Option<SceneRotationRecord>, Self::Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save_record(&self, record: &SceneRotationRecord) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)?;
        let staging = self.staging_path();
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn delete_record(&self) -> Result<(), Self::Error> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Shared in-memory text slot. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStorage {
    text: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryRecordStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the slot with arbitrary text, valid or not.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let storage = Self::default();
        *storage.slot() = Some(text.into());
        storage
    }

    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.slot().clone()
    }

    /// Make every later save fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.text.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStorage for MemoryRecordStorage {
    type Error = RecordStorageError;

    fn load_record(&self) -> Result<Option<SceneRotationRecord>, Self::Error> {
        self.slot()
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(Into::into)
    }

    fn save_record(&self, record: &SceneRotationRecord) -> Result<(), Self::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::other("writes disabled").into());
        }
        let json = serde_json::to_string_pretty(record)?;
        *self.slot() = Some(json);
        Ok(())
    }

    fn delete_record(&self) -> Result<(), Self::Error> {
        *self.slot() = None;
        Ok(())
    }
}

/// Load a record, treating missing or unreadable data as a fresh start.
pub fn load_or_default<S: RecordStorage>(storage: &S) -> SceneRotationRecord {
    match storage.load_record() {
        Ok(Some(record)) => {
            log::info!(
                "loaded scene rotation record: {} episodes, scene index {}",
                record.total_episodes,
                record.current_scene_index
            );
            record
        }
        Ok(None) => {
            log::info!("no scene rotation record found; starting fresh");
            SceneRotationRecord::default()
        }
        Err(err) => {
            log::warn!("failed to load scene rotation record ({err}); starting fresh");
            SceneRotationRecord::default()
        }
    }
}

/// Persist a record. Failures are logged and reported as `false`.
pub fn save_or_log<S: RecordStorage>(storage: &S, record: &SceneRotationRecord) -> bool {
    match storage.save_record(record) {
        Ok(()) => {
            log::debug!(
                "saved scene rotation record: {} episodes, scene index {}",
                record.total_episodes,
                record.current_scene_index
            );
            true
        }
        Err(err) => {
            log::error!("failed to save scene rotation record: {err}");
            false
        }
    }
}

/// Owns the live record and writes it through to storage.
#[derive(Debug)]
pub struct SceneProgressionStore<S> {
    storage: S,
    settings: RotationSettings,
    record: SceneRotationRecord,
}

impl<S: RecordStorage> SceneProgressionStore<S> {
    /// Load the stored record and move it onto the scene the settings call for.
    ///
    /// # Errors
    ///
    /// Returns an error when `settings` fail [`RotationSettings::validate`].
    pub fn open(storage: S, settings: RotationSettings) -> Result<Self, ProgressionError> {
        settings.validate()?;
        let mut record = load_or_default(&storage);
        let target = settings.target_index(record.total_episodes);
        if target != record.current_scene_index {
            log::info!(
                "scene rotation: moving from index {} to {target} for episode {}",
                record.current_scene_index,
                record.total_episodes
            );
        }
        record.current_scene_index = target;
        Ok(Self {
            storage,
            settings,
            record,
        })
    }

    #[must_use]
    pub const fn record(&self) -> SceneRotationRecord {
        self.record
    }

    #[must_use]
    pub const fn settings(&self) -> RotationSettings {
        self.settings
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn current_scene_index(&self) -> u32 {
        self.record.current_scene_index
    }

    #[must_use]
    pub fn current_scene<'a>(&self, catalog: &'a SceneCatalog) -> &'a Scene {
        catalog.get_clamped(self.record.current_scene_index)
    }

    /// Count a finished episode and save. Call exactly once per episode.
    pub fn record_episode_end(&mut self, outcome: EpisodeOutcome) -> SceneAdvance {
        let advance = record_episode_end(self.record, outcome, &self.settings);
        self.record = advance.record;
        if advance.scene_changed {
            log::info!(
                "scene rotation: switching to scene index {} after {} episodes",
                advance.new_scene_index,
                advance.record.total_episodes
            );
        }
        self.save();
        advance
    }

    /// Zero every counter and save immediately.
    pub fn reset_episode_count(&mut self) -> bool {
        self.record = SceneRotationRecord {
            current_scene_index: self.settings.target_index(0),
            ..SceneRotationRecord::default()
        };
        log::info!("scene rotation: counters reset");
        self.save()
    }

    pub fn save(&self) -> bool {
        save_or_log(&self.storage, &self.record)
    }
}

/// Cloneable handle for episodes that share one store.
#[derive(Debug)]
pub struct SharedProgression<S> {
    inner: Arc<Mutex<SceneProgressionStore<S>>>,
}

impl<S> Clone for SharedProgression<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RecordStorage> SharedProgression<S> {
    #[must_use]
    pub fn new(store: SceneProgressionStore<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// # Errors
    ///
    /// See [`SceneProgressionStore::open`].
    pub fn open(storage: S, settings: RotationSettings) -> Result<Self, ProgressionError> {
        SceneProgressionStore::open(storage, settings).map(Self::new)
    }

    fn lock(&self) -> MutexGuard<'_, SceneProgressionStore<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the store.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut SceneProgressionStore<S>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn record_episode_end(&self, outcome: EpisodeOutcome) -> SceneAdvance {
        self.lock().record_episode_end(outcome)
    }

    pub fn reset_episode_count(&self) -> bool {
        self.lock().reset_episode_count()
    }

    #[must_use]
    pub fn record(&self) -> SceneRotationRecord {
        self.lock().record()
    }

    #[must_use]
    pub fn settings(&self) -> RotationSettings {
        self.lock().settings()
    }

    #[must_use]
    pub fn current_scene_index(&self) -> u32 {
        self.lock().current_scene_index()
    }
}
