//! Values the on-screen HUD needs each frame.
use serde::{Deserialize, Serialize};

use crate::constants::{HUD_CRITICAL_FRACTION, HUD_WARNING_FRACTION};
use crate::episode::{EpisodeOutcome, EpisodeSnapshot};
use crate::progression::SceneRotationRecord;

/// Timer colour bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Calm,
    Warning,
    Critical,
}

impl Urgency {
    #[must_use]
    pub fn from_fraction(time_left_fraction: f64) -> Self {
        if time_left_fraction < HUD_CRITICAL_FRACTION {
            Self::Critical
        } else if time_left_fraction < HUD_WARNING_FRACTION {
            Self::Warning
        } else {
            Self::Calm
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBanner {
    Caught,
    Escaped,
}

impl StatusBanner {
    /// Banner for an outcome. A timeout with no winner shows nothing.
    #[must_use]
    pub const fn for_outcome(outcome: EpisodeOutcome) -> Option<Self> {
        match outcome {
            EpisodeOutcome::ChaserCaughtEvader => Some(Self::Caught),
            EpisodeOutcome::EvaderSurvivedTimeout => Some(Self::Escaped),
            EpisodeOutcome::ChaserTimedOut => None,
        }
    }

    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Caught => "CAUGHT!",
            Self::Escaped => "ESCAPED!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub scene_name: String,
    pub time_remaining: f64,
    pub urgency: Urgency,
    pub chaser_wins: u64,
    pub evader_wins: u64,
    pub total_episodes: u64,
    pub episodes_in_scene: u64,
    pub banner: Option<StatusBanner>,
}

impl HudSnapshot {
    /// Win counts come from the persisted record, never from episode state.
    #[must_use]
    pub fn capture(
        episode: &EpisodeSnapshot,
        record: &SceneRotationRecord,
        episodes_per_scene: u64,
        scene_name: &str,
    ) -> Self {
        let time_remaining = episode.time_remaining.max(0.0);
        let fraction = if episode.max_episode_time > 0.0 {
            time_remaining / episode.max_episode_time
        } else {
            0.0
        };
        Self {
            scene_name: scene_name.to_string(),
            time_remaining,
            urgency: Urgency::from_fraction(fraction),
            chaser_wins: record.chaser_wins,
            evader_wins: record.evader_wins,
            total_episodes: record.total_episodes,
            episodes_in_scene: record.total_episodes % episodes_per_scene.max(1),
            banner: episode.last_outcome.and_then(StatusBanner::for_outcome),
        }
    }

    #[must_use]
    pub fn timer_text(&self) -> String {
        format!("Time: {:.1}s", self.time_remaining)
    }

    #[must_use]
    pub fn chaser_score_text(&self) -> String {
        format!("Chaser Wins: {}", self.chaser_wins)
    }

    #[must_use]
    pub fn evader_score_text(&self) -> String {
        format!("Evader Wins: {}", self.evader_wins)
    }

    #[must_use]
    pub fn status_text(&self) -> &'static str {
        self.banner.map_or("", StatusBanner::text)
    }
}
