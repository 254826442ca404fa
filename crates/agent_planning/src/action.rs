//! The planning-facing action contract and the plan it produces.
//!
//! [`PlanAction`] only exposes what the A* search needs: a name,
//! preconditions, effects, and a weight. Binding parameters and actually
//! calling the game server is the concern of `agent_actions`'s
//! `ActionDescriptor`, which wraps a `PlanAction` with an `execute` body.

use crate::state::StateMap;
use serde::{Deserialize, Serialize};

/// A planning-time action: preconditions gate applicability, effects
/// describe the post-state delta, weight is the A* edge cost.
pub trait PlanAction: Send + Sync {
    fn name(&self) -> &str;
    fn preconditions(&self) -> &StateMap;
    fn effects(&self) -> &StateMap;
    fn weight(&self) -> f64;
}

/// One step of an extracted [`Plan`] — just the action's name. The
/// executor resolves this back to a concrete descriptor via the action
/// registry and binds parameters from the live `ActionContext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub action_name: String,
}

/// An ordered sequence of steps from a start state to a goal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    pub estimated_cost: f64,
}

impl Plan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}
