//! Pursuit Arena Simulation Core
//!
//! Platform-agnostic logic for a two-agent pursuit/evasion training arena:
//! the per-tick episode state machine, reward shaping, observations, and the
//! persisted scene rotation that training advances through. Rendering,
//! physics engines, and learning algorithms stay outside this crate.

pub mod agent;
pub mod body;
pub mod constants;
pub mod contact;
pub mod episode;
pub mod facing;
pub mod hud;
pub mod numbers;
pub mod observation;
pub mod patrol;
pub mod progression;
pub mod reward;
pub mod scene;
pub mod session;
pub mod stun;
pub mod vector;

// Re-export commonly used types
pub use agent::{Agent, AgentConfig, Role, WallTuning};
pub use body::{ArenaBody, MovementMode, WallResponse};
pub use contact::{ArenaBounds, CollisionEvent, CollisionEvents, CollisionKind, ContactTracker};
pub use episode::{
    AgentView, CaptureRewards, EpisodeConfig, EpisodeConfigError, EpisodeOutcome, EpisodePhase,
    EpisodeSnapshot, PatrolView, PursuitEpisode, StepResult, TimeoutPolicy, TimeoutVerdict,
};
pub use facing::Facing;
pub use hud::{HudSnapshot, StatusBanner, Urgency};
pub use observation::{
    EVADER_OBSERVATION_LEN, EVADER_THREAT_BLOCK, ObservationContext, ObservationLayout,
    PURSUER_OBSERVATION_LEN,
};
pub use patrol::{PatrolLeg, PatrolRoute, PatrolSpawn, Patroller};
pub use progression::{
    FileRecordStorage, MemoryRecordStorage, ProgressionError, RecordStorage, RecordStorageError,
    RotationMode, RotationSettings, SceneAdvance, SceneProgressionStore, SceneRotationRecord,
    SharedProgression, load_or_default, record_episode_end, save_or_log,
};
pub use reward::{
    DistanceBand, Envelope, RewardAccumulator, RewardShaping, ShapingContext, SprintBonus,
};
pub use scene::{Scene, SceneCatalog};
pub use session::{EpisodeListener, Observations, SessionError, TickReport, TrainingSession};
pub use stun::{StunController, StunTick};
pub use vector::Vec2;
