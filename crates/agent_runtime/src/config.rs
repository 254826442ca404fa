//! Agent tunables (§3.3): defaults match the numbers named throughout
//! `spec.md`, overridable from an `agent.toml` next to the binary.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// MapCache tile freshness window, seconds (§4.2).
    pub map_ttl_seconds: u64,
    /// CooldownGate buffer added on top of the server-reported cooldown,
    /// seconds (§4.1).
    pub cooldown_buffer_seconds: f64,
    /// Combat samples required before a monster's win rate is trusted
    /// (§3.2 in `agent_world::records`).
    pub minimum_combat_results: usize,
    /// Level delta allowed when engaging an unknown monster.
    pub unknown_monster_max_level_delta: i64,
    /// A* node budget per `plan()` call (§4.5).
    pub max_nodes: usize,
    /// How often the loop persists KnowledgeBase/MapCache, seconds (§4.8).
    pub save_interval_seconds: u64,
    /// How often the loop re-fetches the character snapshot, independent
    /// of action cooldown (§4.8 step 1).
    pub refresh_ttl_seconds: u64,
    /// Backoff when no plan is found, seconds (§4.8 step 4).
    pub no_plan_backoff_seconds: u64,
    /// HTTP request deadline, seconds (§5).
    pub request_timeout_seconds: u64,
    /// Retry policy for transient errors (§5, §7).
    pub retry_base_seconds: f64,
    pub retry_factor: f64,
    pub retry_max_attempts: u32,
    /// Map search radius used by the default goal templates' search
    /// actions when none is otherwise specified.
    pub default_search_radius: u32,
}

impl AgentConfig {
    pub fn cooldown_buffer(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_buffer_seconds)
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_seconds)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_seconds)
    }

    pub fn no_plan_backoff(&self) -> Duration {
        Duration::from_secs(self.no_plan_backoff_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn map_ttl(&self) -> Duration {
        Duration::from_secs(self.map_ttl_seconds)
    }

    /// Loads `agent.toml` from `path` if present; missing file yields
    /// defaults (§6.2's "missing files yield empty stores" convention
    /// extended to configuration).
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            map_ttl_seconds: 180,
            cooldown_buffer_seconds: 1.0,
            minimum_combat_results: 2,
            unknown_monster_max_level_delta: 2,
            max_nodes: 10_000,
            save_interval_seconds: 300,
            refresh_ttl_seconds: 5,
            no_plan_backoff_seconds: 10,
            request_timeout_seconds: 30,
            retry_base_seconds: 1.0,
            retry_factor: 2.0,
            retry_max_attempts: 3,
            default_search_radius: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = AgentConfig::load("/nonexistent/agent.toml").unwrap();
        assert_eq!(config.max_nodes, 10_000);
    }

    #[test]
    fn partial_toml_fills_remaining_fields_from_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(&path, "max_nodes = 500\n").unwrap();
        let config = AgentConfig::load(&path).unwrap();
        assert_eq!(config.max_nodes, 500);
        assert_eq!(config.save_interval_seconds, 300);
    }
}
