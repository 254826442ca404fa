//! Knowledge family: raw map/item lookups and two bookkeeping actions
//! that widen what the agent has scanned or summarize what it already
//! knows (§4.4).

use crate::context::{ActionContext, Target};
use crate::descriptor::ActionDescriptor;
use crate::result::ActionResult;
use crate::support::state;
use agent_client::GameClient;
use agent_planning::{PlanAction, StateMap};
use async_trait::async_trait;
use serde_json::json;

pub struct MapLookupAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl MapLookupAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("knowledge_context.status", "tile_known".into())]),
        }
    }
}

impl PlanAction for MapLookupAction {
    fn name(&self) -> &str {
        "map_lookup"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        5.0
    }
}

#[async_trait]
impl ActionDescriptor for MapLookupAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Coords(position) = ctx.target.clone() else {
            return ActionResult::failure("map_lookup requires a Coords target");
        };
        let tile = {
            let mut map = ctx.map.lock().await;
            if let Some(tile) = map.get(position.x, position.y, true) {
                tile
            } else {
                match client.get_map(position.x, position.y).await {
                    Ok(tile) => {
                        map.put(tile.clone());
                        tile
                    }
                    Err(e) => return ActionResult::failure(e.to_string()),
                }
            }
        };
        ActionResult::success(json!({ "tile": tile }), state(&[("knowledge_context.status", "tile_known".into())]), None)
    }
}

/// Gated behind Open Question 3: only registered/applicable against a
/// client whose `supports_item_search()` returns `true`.
pub struct LookupItemInfoAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl LookupItemInfoAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("knowledge_context.status", "item_known".into())]),
        }
    }
}

impl PlanAction for LookupItemInfoAction {
    fn name(&self) -> &str {
        "lookup_item_info"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        10.0
    }
}

#[async_trait]
impl ActionDescriptor for LookupItemInfoAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        if !client.supports_item_search() {
            return ActionResult::failure("client does not support item search");
        }
        let Target::Item(item_code) = ctx.target.clone() else {
            return ActionResult::failure("lookup_item_info requires an Item target");
        };
        let mut kb = ctx.knowledge.lock().await;
        let Some(item) = kb.get_item(&item_code, Some(client)).await else {
            return ActionResult::failure(format!("unknown item {item_code}"));
        };
        ActionResult::success(
            json!({ "code": item.code, "name": item.name, "level": item.level }),
            state(&[("knowledge_context.status", "item_known".into())]),
            None,
        )
    }
}

/// Widens map coverage around the character by scanning every tile out
/// to `ctx.search.radius`, regardless of content — unlike the
/// content-filtered search used by `find_monsters`/`find_resources`.
pub struct ExploreMapAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl ExploreMapAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("knowledge_context.status", "explored".into())]),
        }
    }
}

impl PlanAction for ExploreMapAction {
    fn name(&self) -> &str {
        "explore_map"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        15.0
    }
}

#[async_trait]
impl ActionDescriptor for ExploreMapAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let center = ctx.character.position();
        let radius = ctx.search.radius;
        let mut map = ctx.map.lock().await;
        let scanned = match map.search(client, center, radius, |_| true, false).await {
            Ok(tiles) => tiles,
            Err(e) => return ActionResult::failure(e.to_string()),
        };
        ActionResult::success(
            json!({ "tiles_scanned": scanned.len() }),
            state(&[("knowledge_context.status", "explored".into())]),
            None,
        )
    }
}

/// Summarizes counts of learned entities — a diagnostic action with no
/// external call, useful as a cheap plan step when a goal only needs to
/// confirm knowledge exists before branching.
pub struct AnalyzeKnowledgeStateAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl AnalyzeKnowledgeStateAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("knowledge_context.status", "summarized".into())]),
        }
    }
}

impl PlanAction for AnalyzeKnowledgeStateAction {
    fn name(&self) -> &str {
        "analyze_knowledge_state"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        10.0
    }
}

#[async_trait]
impl ActionDescriptor for AnalyzeKnowledgeStateAction {
    async fn execute(&self, _client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let known_target = match &ctx.target {
            Target::None => false,
            Target::Item(code) | Target::Monster(code) | Target::Resource(code) => {
                let mut kb = ctx.knowledge.lock().await;
                kb.get_item(code, None).await.is_some()
                    || kb.get_monster(code, None).await.is_some()
                    || kb.get_resource(code, None).await.is_some()
            }
            Target::Coords(_) => true,
        };
        ActionResult::success(json!({ "target_known": known_target }), state(&[("knowledge_context.status", "summarized".into())]), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_client::mock::MockGameClient;
    use agent_client::{CharacterSnapshot, MapTile, Position, SkillLevels};
    use agent_world::{KnowledgeBase, MapCache};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn snapshot() -> CharacterSnapshot {
        CharacterSnapshot {
            name: "alice".into(),
            x: 0,
            y: 0,
            hp: 100,
            max_hp: 100,
            level: 1,
            skills: SkillLevels::default(),
            gold: 0,
            inventory: Vec::new(),
            equipment: Default::default(),
            cooldown_seconds: 0.0,
        }
    }

    fn ctx(character: CharacterSnapshot) -> ActionContext {
        ActionContext::new(character, Arc::new(Mutex::new(KnowledgeBase::new())), Arc::new(Mutex::new(MapCache::new())))
    }

    #[tokio::test]
    async fn map_lookup_fetches_and_caches_unknown_tile() {
        let client = MockGameClient::new().with_character(snapshot()).with_tile(MapTile { x: 1, y: 1, content: None });
        let mut context = ctx(snapshot());
        context.target = Target::Coords(Position::new(1, 1));
        let action = MapLookupAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        let map = context.map.lock().await;
        assert!(map.get(1, 1, true).is_some());
    }

    #[tokio::test]
    async fn lookup_item_info_rejects_client_without_item_search() {
        let client = MockGameClient::new().with_character(snapshot());
        let mut context = ctx(snapshot());
        context.target = Target::Item("copper_dagger".into());
        let action = LookupItemInfoAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn analyze_knowledge_state_reports_false_for_empty_target() {
        let client = MockGameClient::new().with_character(snapshot());
        let mut context = ctx(snapshot());
        let action = AnalyzeKnowledgeStateAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(result.data["target_known"], json!(false));
    }
}
