//! The typed blackboard actions read from and write to. Design Notes §9
//! replaces a dict-like runtime context with an explicit struct: unknown
//! keys are a compile error, not a missed-key runtime fallback.

use agent_client::{CharacterSnapshot, Position};
use agent_world::{KnowledgeBase, MapCache};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The current target of a goal or in-progress plan. A sum type, per
/// Design Notes §9, rather than a handful of `Option<String>` fields that
/// could disagree with each other.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    None,
    Item(String),
    Monster(String),
    Resource(String),
    Coords(Position),
}

impl Default for Target {
    fn default() -> Self {
        Target::None
    }
}

/// Parameters carried into a search-shaped action (`find_monsters`,
/// `find_resources`, `explore_map`).
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub radius: u32,
    pub nearest_only: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self { radius: 10, nearest_only: true }
    }
}

/// Results threaded between plan steps within one planning+execution
/// cycle: a crafting shopping list, the last search hits, the most
/// recent action failure (for divergence/replan diagnostics), and an
/// explicit gather-to-quantity target for standalone gathering goals that
/// aren't driven by a crafting shopping list.
#[derive(Debug, Clone, Default)]
pub struct IntermediateResults {
    pub craft_requirements: Vec<(String, u32)>,
    pub search_hits: Vec<Position>,
    pub last_error: Option<String>,
    pub gather_target_quantity: Option<u32>,
}

/// The mutable blackboard passed through one planning+execution cycle
/// (§3.1). Character snapshot fields are refreshed by the loop before each
/// plan; `knowledge`/`map` are shared handles owned by the loop.
pub struct ActionContext {
    pub character: CharacterSnapshot,
    pub target: Target,
    pub search: SearchParams,
    pub intermediate: IntermediateResults,
    pub knowledge: Arc<Mutex<KnowledgeBase>>,
    pub map: Arc<Mutex<MapCache>>,
}

impl ActionContext {
    pub fn new(character: CharacterSnapshot, knowledge: Arc<Mutex<KnowledgeBase>>, map: Arc<Mutex<MapCache>>) -> Self {
        Self {
            character,
            target: Target::None,
            search: SearchParams::default(),
            intermediate: IntermediateResults::default(),
            knowledge,
            map,
        }
    }

    /// Resets per-goal scratch fields while keeping the character snapshot
    /// and shared handles (§3.3: fields are reset at goal boundaries).
    pub fn reset_for_new_goal(&mut self) {
        self.target = Target::None;
        self.search = SearchParams::default();
        self.intermediate = IntermediateResults::default();
    }
}
