//! The uniform result shape every action's `execute` returns (§4.6).

use agent_planning::StateMap;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ActionResult {
    pub success: bool,
    pub data: Value,
    pub error: Option<String>,
    pub state_changes: StateMap,
    pub cooldown_seconds: Option<f64>,
}

impl ActionResult {
    pub fn success(data: Value, state_changes: StateMap, cooldown_seconds: Option<f64>) -> Self {
        Self { success: true, data, error: None, state_changes, cooldown_seconds }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: Value::Null, error: Some(error.into()), state_changes: StateMap::new(), cooldown_seconds: None }
    }
}
