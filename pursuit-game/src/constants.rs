//! Centralized tuning constants for the pursuit arena.
//!
//! These are the compiled fallbacks behind the embedded JSON data. Anything a
//! trainer is expected to tweak lives in the config structs; the values here
//! only seed their defaults.

// Numeric guards -----------------------------------------------------------
pub(crate) const DIRECTION_EPSILON: f64 = 0.01;
pub(crate) const ELAPSED_EPSILON: f64 = 1e-9;

// Arena --------------------------------------------------------------------
pub(crate) const ARENA_SIZE: f64 = 10.0;
pub(crate) const MAX_EPISODE_TIME: f64 = 30.0;
pub(crate) const ARENA_HALF_EXTENT: f64 = 8.0;
pub(crate) const AGENT_RADIUS: f64 = 0.5;
pub(crate) const CHASER_SPAWN: (f64, f64) = (-5.0, 0.0);
pub(crate) const EVADER_SPAWN: (f64, f64) = (5.0, 0.0);

// Chaser tuning ------------------------------------------------------------
pub(crate) const CHASER_MOVE_FORCE: f64 = 20.0;
pub(crate) const CHASER_MAX_SPEED: f64 = 5.0;
pub(crate) const CHASER_LINEAR_DAMPING: f64 = 2.0;
pub(crate) const CHASER_WALL_PENALTY: f64 = -2.0;
pub(crate) const CHASER_WALL_STAY_PENALTY: f64 = -1.0;
pub(crate) const CHASER_STUN_SECONDS: f64 = 1.0;
pub(crate) const CHASER_WALL_IMPULSE: f64 = 10.0;
pub(crate) const CHASER_URGENCY_PER_TICK: f64 = -0.001;
pub(crate) const CHASER_PROXIMITY_WEIGHT: f64 = 0.1;

// Evader tuning ------------------------------------------------------------
pub(crate) const EVADER_MOVE_SPEED: f64 = 4.5;
pub(crate) const EVADER_ACCELERATION: f64 = 15.0;
pub(crate) const EVADER_LINEAR_DAMPING: f64 = 5.0;
pub(crate) const EVADER_WALL_PENALTY: f64 = -10.0;
pub(crate) const EVADER_WALL_STAY_PENALTY: f64 = -2.0;
pub(crate) const EVADER_STUN_SECONDS: f64 = 2.0;
pub(crate) const EVADER_WALL_IMPULSE: f64 = 3.0;
pub(crate) const EVADER_SURVIVAL_PER_TICK: f64 = 0.01;
pub(crate) const EVADER_GAP_GAIN: f64 = 1.0;
pub(crate) const EVADER_SPRINT_RADIUS: f64 = 3.0;
pub(crate) const EVADER_SPRINT_MIN_SPEED: f64 = 2.0;
pub(crate) const EVADER_SPRINT_REWARD: f64 = 0.005;

// Terminal rewards ---------------------------------------------------------
pub(crate) const CAPTURE_REWARD: f64 = 20.0;
pub(crate) const CAPTURE_TIME_BONUS: f64 = 10.0;
pub(crate) const CAUGHT_PENALTY: f64 = -15.0;
pub(crate) const TIMEOUT_CHASER_REWARD: f64 = -10.0;
pub(crate) const TIMEOUT_EVADER_REWARD: f64 = 10.0;

// Presentation -------------------------------------------------------------
pub(crate) const FACING_MIN_SPEED: f64 = 0.1;
pub(crate) const FACING_AXIS_EPSILON: f64 = 0.01;
pub(crate) const FACING_DIAGONAL_RATIO: f64 = 0.5;
pub(crate) const HUD_CRITICAL_FRACTION: f64 = 0.33;
pub(crate) const HUD_WARNING_FRACTION: f64 = 0.66;
pub(crate) const PATROL_SPEED: f64 = 2.0;
pub(crate) const PATROL_FRAME_SECONDS: f64 = 0.4;

// Scene rotation -----------------------------------------------------------
pub(crate) const EPISODES_PER_SCENE: u64 = 200;
pub(crate) const DEFAULT_FIXED_SCENE: u32 = 2;
pub(crate) const RECORD_FILE_NAME: &str = "SceneRotationData.json";
