pub mod policy;
pub mod reports;
pub mod runner;
pub mod scenarios;

pub use policy::{PursuitPolicy, Strategy};
pub use runner::{EpisodeSummary, RunPlan, RunSummary, run_episodes};
pub use scenarios::{
    ScenarioCtx, ScenarioResult, expand_scenarios, get_scenario, list_scenarios, run_scenarios,
};

/// Durations travel as whole milliseconds in reports.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX)))
    }
}
