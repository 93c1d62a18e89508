//! Training session wrapper binding one episode to the shared scene rotation.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::Role;
use crate::contact::{CollisionEvent, ContactTracker};
use crate::episode::{
    EpisodeConfig, EpisodeConfigError, EpisodeOutcome, EpisodeSnapshot, PursuitEpisode,
    StepResult,
};
use crate::hud::HudSnapshot;
use crate::progression::{ProgressionError, RecordStorage, SceneAdvance, SharedProgression};
use crate::scene::{Scene, SceneCatalog};
use crate::vector::Vec2;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] EpisodeConfigError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
}

/// Notified once per finished episode, after the outcome has been counted.
pub trait EpisodeListener {
    fn on_episode_end(&mut self, outcome: EpisodeOutcome, advance: &SceneAdvance);
}

impl<F> EpisodeListener for F
where
    F: FnMut(EpisodeOutcome, &SceneAdvance),
{
    fn on_episode_end(&mut self, outcome: EpisodeOutcome, advance: &SceneAdvance) {
        self(outcome, advance);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Observations {
    pub chaser: Vec<f64>,
    pub evader: Vec<f64>,
}

impl Observations {
    #[must_use]
    pub fn get(&self, role: Role) -> &[f64] {
        match role {
            Role::Chaser => &self.chaser,
            Role::Evader => &self.evader,
        }
    }
}

/// Output of one session tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub step: StepResult,
    /// Set on the tick an episode ended; the session has already reset.
    pub episode_end: Option<SceneAdvance>,
    /// Observations of the state this tick produced, taken before any reset.
    pub observations: Observations,
}

/// Drives one [`PursuitEpisode`] tick by tick: detects contacts, counts each
/// finished episode exactly once, and moves to the next scene when the
/// rotation says so.
pub struct TrainingSession<S> {
    episode: PursuitEpisode,
    contacts: ContactTracker,
    catalog: SceneCatalog,
    progression: SharedProgression<S>,
    scene_index: u32,
    listener: Option<Box<dyn EpisodeListener + Send>>,
}

impl<S: RecordStorage> TrainingSession<S> {
    /// Build a session placed in the store's current scene.
    ///
    /// # Errors
    ///
    /// Returns an error if the episode config is invalid or the rotation
    /// settings do not match the catalog.
    pub fn new(
        config: EpisodeConfig,
        catalog: SceneCatalog,
        progression: SharedProgression<S>,
    ) -> Result<Self, SessionError> {
        progression.settings().validate_against(&catalog)?;
        let scene_index = progression.current_scene_index();
        let scene = catalog.get_clamped(scene_index);
        let episode = PursuitEpisode::in_scene(config, scene)?;
        let mut contacts = ContactTracker::default();
        contacts.set_bounds(scene.bounds);
        log::info!("training session starting in '{}'", scene.name);
        Ok(Self {
            episode,
            contacts,
            catalog,
            progression,
            scene_index,
            listener: None,
        })
    }

    #[must_use]
    pub fn with_listener(mut self, listener: impl EpisodeListener + Send + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn set_listener(&mut self, listener: Option<Box<dyn EpisodeListener + Send>>) {
        self.listener = listener;
    }

    #[must_use]
    pub const fn episode(&self) -> &PursuitEpisode {
        &self.episode
    }

    pub const fn episode_mut(&mut self) -> &mut PursuitEpisode {
        &mut self.episode
    }

    #[must_use]
    pub const fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn progression(&self) -> &SharedProgression<S> {
        &self.progression
    }

    #[must_use]
    pub const fn scene_index(&self) -> u32 {
        self.scene_index
    }

    #[must_use]
    pub fn current_scene(&self) -> &Scene {
        self.catalog.get_clamped(self.scene_index)
    }

    pub fn tick(&mut self, dt: f64, chaser_action: Vec2, evader_action: Vec2) -> TickReport {
        self.tick_with_events(dt, chaser_action, evader_action, &[])
    }

    /// Tick with driver-supplied contacts appended after the detected ones.
    pub fn tick_with_events(
        &mut self,
        dt: f64,
        chaser_action: Vec2,
        evader_action: Vec2,
        extra_events: &[CollisionEvent],
    ) -> TickReport {
        let mut events = self.contacts.detect(&self.episode);
        events.extend(extra_events.iter().copied());
        let step = self
            .episode
            .advance(dt, chaser_action, evader_action, &events);
        let observations = self.observations();
        let episode_end = step.terminal.map(|outcome| self.finish_episode(outcome));
        TickReport {
            step,
            episode_end,
            observations,
        }
    }

    fn finish_episode(&mut self, outcome: EpisodeOutcome) -> SceneAdvance {
        let advance = self.progression.record_episode_end(outcome);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_episode_end(outcome, &advance);
        }

        // Another session sharing the store may have moved the rotation on.
        if advance.new_scene_index == self.scene_index {
            self.episode.reset();
            self.contacts.reset();
        } else {
            self.scene_index = advance.new_scene_index;
            let scene = self.catalog.get_clamped(self.scene_index);
            log::info!("training session moving to '{}'", scene.name);
            self.episode.reset_with_scene(scene);
            self.contacts.set_bounds(scene.bounds);
        }
        advance
    }

    #[must_use]
    pub fn observations(&self) -> Observations {
        Observations {
            chaser: self.episode.observe(Role::Chaser),
            evader: self.episode.observe(Role::Evader),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> EpisodeSnapshot {
        self.episode.snapshot()
    }

    #[must_use]
    pub fn hud(&self) -> HudSnapshot {
        let settings = self.progression.settings();
        HudSnapshot::capture(
            &self.episode.snapshot(),
            &self.progression.record(),
            settings.episodes_per_scene,
            &self.current_scene().name,
        )
    }
}
