//! Named catalogue of action descriptors (§4.4). Immutable after
//! construction (§3.3): built once at process start from the full action
//! catalogue, then shared by reference with the planner and executor.

use crate::descriptor::ActionDescriptor;
use agent_planning::{PlanAction, StateMap};
use std::collections::BTreeMap;

pub struct ActionRegistry {
    actions: BTreeMap<String, Box<dyn ActionDescriptor>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self { actions: BTreeMap::new() }
    }

    pub fn register(&mut self, action: Box<dyn ActionDescriptor>) {
        self.actions.insert(action.name().to_string(), action);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ActionDescriptor> {
        self.actions.get(name).map(|b| b.as_ref())
    }

    /// All registered descriptors, ordered alphabetically by action name
    /// (the backing map's natural iteration order), not registration
    /// order.
    pub fn all_actions(&self) -> Vec<&dyn ActionDescriptor> {
        self.actions.values().map(|b| b.as_ref()).collect()
    }

    /// As [`PlanAction`] trait objects, for handing to
    /// [`agent_planning::GoapPlanner::plan`].
    pub fn plan_actions(&self) -> Vec<&dyn PlanAction> {
        self.actions.values().map(|descriptor| descriptor.as_ref() as &dyn PlanAction).collect()
    }

    /// Descriptors whose preconditions currently hold.
    pub fn applicable(&self, state: &StateMap) -> Vec<&dyn ActionDescriptor> {
        self.all_actions().into_iter().filter(|a| agent_planning::matches(state, a.preconditions())).collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
