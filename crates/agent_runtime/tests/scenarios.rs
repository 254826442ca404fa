//! End-to-end scenarios against a mock `GameClient` (§8.4): no network
//! access, the registry/executor/goal-manager wired exactly as the
//! binary wires them, driven from outside the crate to exercise the
//! public surface only.

use agent_actions::context::Target;
use agent_actions::{build_default_registry, ActionContext, ActionRegistry};
use agent_client::mock::MockGameClient;
use agent_client::{CharacterSnapshot, Position, SkillLevels};
use agent_planning::StateMap;
use agent_runtime::goal_manager::{GoalManager, GoalTargets};
use agent_runtime::{AgentConfig, ActionExecutor};
use agent_world::{KnowledgeBase, MapCache};
use std::sync::Arc;
use tokio::sync::Mutex;

fn character(x: i32, y: i32, hp: i32, max_hp: i32) -> CharacterSnapshot {
    CharacterSnapshot {
        name: "scenario".into(),
        x,
        y,
        hp,
        max_hp,
        level: 1,
        skills: SkillLevels::default(),
        gold: 0,
        inventory: Vec::new(),
        equipment: Default::default(),
        cooldown_seconds: 0.0,
    }
}

fn ctx(snapshot: CharacterSnapshot) -> ActionContext {
    ActionContext::new(snapshot, Arc::new(Mutex::new(KnowledgeBase::new())), Arc::new(Mutex::new(MapCache::new())))
}

/// Scenario 1: moving to the tile the character already occupies succeeds
/// without mutating position or arming the cooldown beyond its current
/// value.
#[tokio::test]
async fn scenario_1_move_to_current_tile_is_a_no_op_success() {
    let snapshot = character(5, 3, 100, 100);
    let client = MockGameClient::new().with_character(snapshot.clone());
    let registry = build_default_registry();
    let mut context = ctx(snapshot);
    context.target = Target::Coords(Position::new(5, 3));
    let mut state = StateMap::new();
    let executor = ActionExecutor::new(&AgentConfig::default());

    let outcome = executor.execute(&registry, &client, &mut context, "move", &mut state, || false).await;

    assert!(outcome.result.success);
    assert_eq!(outcome.result.data["already_at_destination"], true);
    assert_eq!(context.character.x, 5);
    assert_eq!(context.character.y, 3);
    assert!(executor.cooldown().is_ready(), "already-at-destination should not arm a new cooldown");
}

/// Scenario 5: a character at critical HP is steered toward `rest`
/// before any leveling goal, and executing it restores HP to full.
#[tokio::test]
async fn scenario_5_low_hp_selects_rest_goal_and_heals_to_full() {
    let snapshot = character(0, 0, 15, 100);
    let goal_manager = GoalManager::new(GoalTargets::new());
    let (goal_name, _) = goal_manager.next_goal(&snapshot);
    assert_eq!(goal_name, "rest_and_heal");

    let client = MockGameClient::new().with_character(snapshot.clone());
    let registry = build_default_registry();
    let mut context = ctx(snapshot);
    let mut state = StateMap::new();
    let executor = ActionExecutor::new(&AgentConfig::default());

    let outcome = executor.execute(&registry, &client, &mut context, "rest", &mut state, || false).await;

    assert!(outcome.result.success);
    assert_eq!(context.character.hp, context.character.max_hp);
}

/// Scenario 3 (partial, at the action-chain level): finding a resource
/// hands a coordinate to `move_to_resource`, and that coordinate is the
/// one the mock server actually receives — the `gathering_context`
/// precondition the planner chains the two actions on on is exactly the
/// one `find_resources` reports back.
#[tokio::test]
async fn scenario_3_find_resources_chains_into_move_to_resource() {
    use agent_client::{TileContent, TileContentType};

    let snapshot = character(0, 0, 100, 100);
    let tile = agent_client::MapTile {
        x: 2,
        y: 0,
        content: Some(TileContent { content_type: TileContentType::Resource, code: "ash_wood".into() }),
    };
    let client = MockGameClient::new().with_character(snapshot.clone()).with_tile(tile);
    let registry = build_default_registry();
    let mut context = ctx(snapshot);
    context.target = Target::Resource("ash_wood".into());
    let mut state = StateMap::new();
    let executor = ActionExecutor::new(&AgentConfig::default());

    let find_outcome = executor.execute(&registry, &client, &mut context, "find_resources", &mut state, || false).await;
    assert!(find_outcome.result.success, "{:?}", find_outcome.result.error);
    assert!(agent_planning::matches(&state, registry.get("move_to_resource").unwrap().preconditions()));

    let move_outcome = executor.execute(&registry, &client, &mut context, "move_to_resource", &mut state, || false).await;
    assert!(move_outcome.result.success, "{:?}", move_outcome.result.error);
    assert_eq!(context.character.x, 2);
    assert_eq!(context.character.y, 0);
}

/// Scenario 6: when a queued step's preconditions no longer hold against
/// the post-execution state (the observable form of plan divergence for
/// effects modeled as `Pending`), the plan must be treated as stale — the
/// same check `AIPlayerLoop::next_step_still_applicable` performs before
/// advancing the cursor.
#[tokio::test]
async fn scenario_6_stale_precondition_after_unexpected_outcome_is_detected() {
    let registry: ActionRegistry = build_default_registry();
    // After a plan was built expecting `find_resources` to succeed, the
    // real run state never reached "located" (e.g. the server had no
    // matching tile within radius) — `move_to_resource`'s precondition
    // must no longer hold.
    let state = StateMap::new();
    let move_to_resource = registry.get("move_to_resource").unwrap();
    assert!(!agent_planning::matches(&state, move_to_resource.preconditions()));
}
