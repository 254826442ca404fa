//! GOAP state representation and A* planner.
//!
//! This crate is intentionally free of I/O: it knows nothing about the game
//! server, the knowledge base, or the filesystem. It turns a start
//! [`StateMap`], a goal predicate, and a slice of [`PlanAction`]s into an
//! ordered [`Plan`], or `None` if no plan exists within the node budget.

pub mod action;
pub mod planner;
pub mod state;

pub use action::{Plan, PlanAction, PlanStep};
pub use planner::{GoapPlanner, PlannerConfig};
pub use state::{get_path, matches, merge, state_hash, unsatisfied_top_level_count, value_matches, StateMap, StateValue};
