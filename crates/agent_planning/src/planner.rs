//! A* planner over [`StateMap`] × [`PlanAction`].
//!
//! Mirrors the shape of a textbook GOAP A* search (open set as a binary
//! heap ordered by `f = g + h`, closed set keyed by a stable state hash)
//! but keeps an explicit node arena with parent indices rather than
//! reference-counted back-pointers, since plans here can run long enough
//! (crafting chains, multi-hop gathers) that arena reuse matters more than
//! it would for a game-tick GOAP planner.

use crate::action::{Plan, PlanAction, PlanStep};
use crate::state::{matches, merge, state_hash, unsatisfied_top_level_count, StateMap};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Tunables for a single `plan()` call.
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    pub max_nodes: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { max_nodes: 10_000 }
    }
}

struct Node {
    state: StateMap,
    g: f64,
    action: Option<String>,
    parent: Option<usize>,
}

/// A min-heap entry. Lower `f`, then lower `g`, then lower `seq` (insertion
/// order) wins — `BinaryHeap` is a max-heap, so `Ord` is implemented
/// inverted.
struct HeapEntry {
    f: f64,
    g: f64,
    seq: u64,
    idx: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.g == other.g && self.seq == other.seq
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.g.partial_cmp(&self.g).unwrap_or(Ordering::Equal))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A* planner producing deterministic, byte-identical plans for a given
/// `(state, registry, goal)` under stable tie-breaking.
pub struct GoapPlanner {
    config: PlannerConfig,
}

impl GoapPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Plans from `start` to `goal` using `actions`, in the order given —
    /// that order is also the tie-break order when two expansions reach
    /// equal `f` and `g`.
    pub fn plan(
        &self,
        start: &StateMap,
        goal: &StateMap,
        actions: &[&dyn PlanAction],
    ) -> Option<Plan> {
        if matches(start, goal) {
            return Some(Plan::empty());
        }
        if self.config.max_nodes == 0 {
            return None;
        }

        let mut arena = vec![Node {
            state: start.clone(),
            g: 0.0,
            action: None,
            parent: None,
        }];
        let start_h = unsatisfied_top_level_count(start, goal) as f64;

        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry { f: start_h, g: 0.0, seq: 0, idx: 0 });

        let mut best_g: HashMap<String, f64> = HashMap::new();
        let mut seq = 1u64;
        let mut expansions = 0usize;

        while let Some(entry) = heap.pop() {
            expansions += 1;
            if expansions > self.config.max_nodes {
                return None;
            }

            let node_state = arena[entry.idx].state.clone();
            let node_g = arena[entry.idx].g;

            if matches(&node_state, goal) {
                return Some(self.extract_plan(&arena, entry.idx));
            }

            let hash = state_hash(&node_state);
            if let Some(&recorded) = best_g.get(&hash) {
                if recorded < node_g {
                    continue;
                }
            }
            best_g.insert(hash, node_g);

            for action in actions {
                if !matches(&node_state, action.preconditions()) {
                    continue;
                }
                let mut next_state = node_state.clone();
                merge(&mut next_state, action.effects());
                let next_hash = state_hash(&next_state);
                let new_g = node_g + action.weight();

                if let Some(&recorded) = best_g.get(&next_hash) {
                    if recorded <= new_g {
                        continue;
                    }
                }

                let h = unsatisfied_top_level_count(&next_state, goal) as f64;
                let idx = arena.len();
                arena.push(Node {
                    state: next_state,
                    g: new_g,
                    action: Some(action.name().to_string()),
                    parent: Some(entry.idx),
                });
                heap.push(HeapEntry { f: new_g + h, g: new_g, seq, idx });
                seq += 1;
            }
        }

        None
    }

    fn extract_plan(&self, arena: &[Node], goal_idx: usize) -> Plan {
        let mut steps = Vec::new();
        let mut cost = 0.0;
        let mut cursor = Some(goal_idx);
        while let Some(idx) = cursor {
            let node = &arena[idx];
            if let Some(name) = &node.action {
                steps.push(PlanStep { action_name: name.clone() });
            }
            cursor = node.parent;
        }
        steps.reverse();
        if let Some(last) = arena.get(goal_idx) {
            cost = last.g;
        }
        Plan { steps, estimated_cost: cost }
    }
}

impl Default for GoapPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateValue;

    struct TestAction {
        name: &'static str,
        preconditions: StateMap,
        effects: StateMap,
        weight: f64,
    }

    impl PlanAction for TestAction {
        fn name(&self) -> &str {
            self.name
        }
        fn preconditions(&self) -> &StateMap {
            &self.preconditions
        }
        fn effects(&self) -> &StateMap {
            &self.effects
        }
        fn weight(&self) -> f64 {
            self.weight
        }
    }

    fn action(
        name: &'static str,
        preconditions: &[(&str, StateValue)],
        effects: &[(&str, StateValue)],
        weight: f64,
    ) -> TestAction {
        TestAction {
            name,
            preconditions: preconditions.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect(),
            effects: effects.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect(),
            weight,
        }
    }

    fn goal(pairs: &[(&str, StateValue)]) -> StateMap {
        pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn refs(actions: &[TestAction]) -> Vec<&dyn PlanAction> {
        actions.iter().map(|a| a as &dyn PlanAction).collect()
    }

    #[test]
    fn finds_two_step_cheaper_plan_over_direct_expensive_action() {
        let actions = vec![
            action("gather_herbs", &[], &[("has_herbs", StateValue::Bool(true))], 5.0),
            action(
                "craft_food",
                &[("has_herbs", StateValue::Bool(true))],
                &[("has_food", StateValue::Bool(true))],
                3.0,
            ),
            action("expensive_direct", &[], &[("has_food", StateValue::Bool(true))], 20.0),
        ];
        let planner = GoapPlanner::default();
        let plan = planner
            .plan(&StateMap::new(), &goal(&[("has_food", StateValue::Bool(true))]), &refs(&actions))
            .unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].action_name, "gather_herbs");
        assert_eq!(plan.steps[1].action_name, "craft_food");
        assert_eq!(plan.estimated_cost, 8.0);
    }

    #[test]
    fn deterministic_tie_breaking_prefers_earlier_registration_order() {
        let actions = vec![
            action("action_a", &[], &[("state_x", StateValue::Bool(true))], 5.0),
            action("action_b", &[], &[("state_x", StateValue::Bool(true))], 5.0),
        ];
        let planner = GoapPlanner::default();
        let g = goal(&[("state_x", StateValue::Bool(true))]);
        for _ in 0..5 {
            let plan = planner.plan(&StateMap::new(), &g, &refs(&actions)).unwrap();
            assert_eq!(plan.steps[0].action_name, "action_a");
        }
    }

    #[test]
    fn max_nodes_zero_returns_no_plan() {
        let planner = GoapPlanner::new(PlannerConfig { max_nodes: 0 });
        let actions = vec![action("a", &[], &[("x", StateValue::Bool(true))], 1.0)];
        assert!(planner
            .plan(&StateMap::new(), &goal(&[("x", StateValue::Bool(true))]), &refs(&actions))
            .is_none());
    }

    #[test]
    fn empty_registry_with_goal_already_satisfied_returns_empty_plan() {
        let mut state = StateMap::new();
        state.insert("x".into(), StateValue::Bool(true));
        let planner = GoapPlanner::default();
        let plan = planner.plan(&state, &goal(&[("x", StateValue::Bool(true))]), &[]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn no_plan_found_when_preconditions_unreachable() {
        let actions = vec![action(
            "useless",
            &[("impossible", StateValue::Bool(true))],
            &[("has_food", StateValue::Bool(true))],
            1.0,
        )];
        let planner = GoapPlanner::default();
        assert!(planner
            .plan(&StateMap::new(), &goal(&[("has_food", StateValue::Bool(true))]), &refs(&actions))
            .is_none());
    }

    #[test]
    fn respects_max_nodes_budget_on_long_chains() {
        let actions: Vec<TestAction> = (0..50)
            .map(|i| {
                action(
                    Box::leak(format!("step_{i}").into_boxed_str()),
                    &[(Box::leak(format!("state_{i}").into_boxed_str()), StateValue::Bool(true))],
                    &[(Box::leak(format!("state_{}", i + 1).into_boxed_str()), StateValue::Bool(true))],
                    1.0,
                )
            })
            .collect();
        let mut state = StateMap::new();
        state.insert("state_0".into(), StateValue::Bool(true));
        let planner = GoapPlanner::new(PlannerConfig { max_nodes: 5 });
        let plan = planner.plan(&state, &goal(&[("state_50", StateValue::Bool(true))]), &refs(&actions));
        assert!(plan.is_none());
    }
}
