//! Gathering family: locate a resource or workshop tile and harvest from
//! it. `gather_resource_quantity` loops internally toward a target
//! quantity, capped at `MAX_GATHER_ATTEMPTS`, since the unit of work the
//! planner reasons about for a crafting shopping list is the quantity,
//! not one call.

use crate::context::{ActionContext, Target};
use crate::descriptor::ActionDescriptor;
use crate::result::ActionResult;
use crate::support::{character_state_delta, state};
use agent_client::{GameClient, TileContentType};
use agent_planning::{PlanAction, StateMap, StateValue};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;

/// Hard stop on repeated `gather` calls within one `gather_resource_quantity`
/// step (spec scenario 2), so a resource that never yields the needed
/// material can't spin the action forever.
const MAX_GATHER_ATTEMPTS: u32 = 20;

pub struct FindResourcesAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl FindResourcesAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("gathering_context.status", "located".into())]),
        }
    }
}

impl PlanAction for FindResourcesAction {
    fn name(&self) -> &str {
        "find_resources"
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
impl ActionDescriptor for FindResourcesAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Resource(material_code) = ctx.target.clone() else {
            return ActionResult::failure("find_resources requires a Resource target");
        };
        let center = ctx.character.position();
        let radius = ctx.search.radius;

        // Open Question 1: prefer knowledge (no API), then the map cache
        // (cache-first, API on miss).
        let candidates = {
            let kb = ctx.knowledge.lock().await;
            let map = ctx.map.lock().await;
            kb.find_resources_for_material(&material_code)
                .into_iter()
                .flat_map(|code| kb.find_resources_in_map(&[code], center, radius, &map))
                .collect::<Vec<_>>()
        };

        let hit = if let Some((position, _)) = candidates.first() {
            *position
        } else {
            let mut map = ctx.map.lock().await;
            let hits = match map
                .search(client, center, radius, |c| c.content_type == TileContentType::Resource, ctx.search.nearest_only)
                .await
            {
                Ok(hits) => hits,
                Err(e) => return ActionResult::failure(e.to_string()),
            };
            match hits.into_iter().find(|t| {
                t.content.as_ref().map(|c| c.code.clone()).unwrap_or_default() == material_code
            }) {
                Some(tile) => agent_client::Position::new(tile.x, tile.y),
                None => return ActionResult::failure(format!("no resource for {material_code} found within radius {radius}")),
            }
        };

        {
            let mut kb = ctx.knowledge.lock().await;
            kb.learn_location(&material_code, hit);
        }
        ctx.intermediate.search_hits = vec![hit];
        ctx.target = Target::Coords(hit);
        ActionResult::success(json!({ "location": { "x": hit.x, "y": hit.y } }), state(&[("gathering_context.status", "located".into())]), None)
    }
}

pub struct FindWorkshopsAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl FindWorkshopsAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("gathering_context.status", "workshop_located".into())]),
        }
    }
}

impl PlanAction for FindWorkshopsAction {
    fn name(&self) -> &str {
        "find_workshops"
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
impl ActionDescriptor for FindWorkshopsAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let center = ctx.character.position();
        let radius = ctx.search.radius;
        let mut map = ctx.map.lock().await;
        let hits = match map.search(client, center, radius, |c| c.content_type == TileContentType::Workshop, ctx.search.nearest_only).await {
            Ok(hits) => hits,
            Err(e) => return ActionResult::failure(e.to_string()),
        };
        drop(map);
        let Some(tile) = hits.first() else {
            return ActionResult::failure(format!("no workshop found within radius {radius}"));
        };
        let skill = tile.content.as_ref().map(|c| c.code.clone()).unwrap_or_default();
        let position = agent_client::Position::new(tile.x, tile.y);
        {
            let mut kb = ctx.knowledge.lock().await;
            kb.learn_workshop(&skill, &skill, position);
        }
        ActionResult::success(
            json!({ "location": { "x": position.x, "y": position.y }, "skill": skill }),
            state(&[("gathering_context.status", "workshop_located".into())]),
            None,
        )
    }
}

pub struct GatherResourcesAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl GatherResourcesAction {
    pub fn new() -> Self {
        Self {
            preconditions: state(&[("gathering_context.status", "located".into())]),
            effects: state(&[("gathering_context.status", "gathered".into())]),
        }
    }
}

impl PlanAction for GatherResourcesAction {
    fn name(&self) -> &str {
        "gather_resources"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        8.0
    }
}

#[async_trait]
impl ActionDescriptor for GatherResourcesAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        match client.gather(&ctx.character.name).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                let mut changes = character_state_delta(&ctx.character);
                agent_planning::merge(&mut changes, &state(&[("gathering_context.status", "gathered".into())]));
                ActionResult::success(json!({ "items": result.items }), changes, Some(result.cooldown_seconds))
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

/// Gathers repeatedly from the located tile until the target material's
/// inventory count reaches the requested quantity, or `MAX_GATHER_ATTEMPTS`
/// is exhausted (spec scenario 2). Unlike `gather_resources`, the
/// repetition lives inside this one descriptor, since the target quantity
/// — not a fixed single call — is the unit of work the planner reasons
/// about for a crafting shopping list.
pub struct GatherResourceQuantityAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl GatherResourceQuantityAction {
    pub fn new() -> Self {
        Self {
            preconditions: state(&[("gathering_context.status", "located".into())]),
            effects: state(&[("materials.status", StateValue::Pending)]),
        }
    }
}

impl PlanAction for GatherResourceQuantityAction {
    fn name(&self) -> &str {
        "gather_resource_quantity"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        8.0
    }
}

impl GatherResourceQuantityAction {
    /// The quantity to gather toward: the crafting shopping list's entry
    /// for this material if one exists (scenario 3's `gather_resource_
    /// quantity(4)`), else the explicit standalone target, else a single
    /// unit.
    fn target_quantity(ctx: &ActionContext, material_code: &str) -> u32 {
        ctx.intermediate
            .craft_requirements
            .iter()
            .find(|(code, _)| code == material_code)
            .map(|(_, quantity)| *quantity)
            .or(ctx.intermediate.gather_target_quantity)
            .unwrap_or(1)
    }
}

#[async_trait]
impl ActionDescriptor for GatherResourceQuantityAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Resource(material_code) = ctx.target.clone() else {
            return ActionResult::failure("gather_resource_quantity requires a Resource target");
        };
        let target_quantity = Self::target_quantity(ctx, &material_code);

        let mut attempts = 0;
        let mut last_cooldown = 0.0;
        while attempts < MAX_GATHER_ATTEMPTS && ctx.character.inventory_quantity(&material_code) < target_quantity {
            match client.gather(&ctx.character.name).await {
                Ok(result) => {
                    ctx.character = result.character.clone();
                    last_cooldown = result.cooldown_seconds;
                    attempts += 1;
                    let reached = ctx.character.inventory_quantity(&material_code) >= target_quantity;
                    if !reached && attempts < MAX_GATHER_ATTEMPTS {
                        sleep(Duration::from_secs_f64(last_cooldown)).await;
                    }
                }
                Err(e) => return ActionResult::failure(e.to_string()),
            }
        }

        let gathered = ctx.character.inventory_quantity(&material_code);
        let status = if gathered >= target_quantity { "sufficient" } else { "partial" };
        let mut changes = character_state_delta(&ctx.character);
        agent_planning::merge(&mut changes, &state(&[("materials.status", status.into())]));
        ActionResult::success(
            json!({ "attempts": attempts, "quantity": gathered, "target_quantity": target_quantity }),
            changes,
            Some(last_cooldown),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_client::mock::MockGameClient;
    use agent_client::{CharacterSnapshot, MapTile, Position, ResourceData, SkillLevels, TileContent};
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
    async fn find_resources_falls_back_to_map_search_when_unknown_to_knowledge() {
        let client = MockGameClient::new().with_character(snapshot()).with_tile(MapTile {
            x: 2,
            y: 0,
            content: Some(TileContent { content_type: TileContentType::Resource, code: "copper_rocks".into() }),
        });
        let mut context = ctx(snapshot());
        context.target = Target::Resource("copper_rocks".into());
        context.search.radius = 5;
        let action = FindResourcesAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(context.intermediate.search_hits, vec![Position::new(2, 0)]);
    }

    #[tokio::test]
    async fn find_resources_prefers_known_location_over_map_search() {
        let client = MockGameClient::new().with_character(snapshot());
        let mut context = ctx(snapshot());
        let client2 = MockGameClient::new().with_resource(ResourceData {
            code: "copper_rocks".into(),
            skill: "mining".into(),
            level: 1,
            drops: vec![agent_client::DropRate { code: "copper_ore".into(), rate: 100, min_quantity: 1, max_quantity: 1 }],
        });
        {
            let mut kb = context.knowledge.lock().await;
            kb.get_resource("copper_rocks", Some(&client2)).await;
            kb.learn_location("copper_rocks", Position::new(9, 9));
        }
        {
            let mut map = context.map.lock().await;
            map.put(MapTile { x: 9, y: 9, content: Some(TileContent { content_type: TileContentType::Resource, code: "copper_rocks".into() }) });
        }
        context.target = Target::Resource("copper_ore".into());
        context.search.radius = 20;
        let action = FindResourcesAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(context.intermediate.search_hits, vec![Position::new(9, 9)]);
    }

    #[tokio::test]
    async fn gather_resources_without_location_still_calls_client() {
        let client = MockGameClient::new().with_character(snapshot());
        let mut context = ctx(snapshot());
        let action = GatherResourcesAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
    }

    #[tokio::test(start_paused = true)]
    async fn gather_resource_quantity_reports_sufficient_once_target_reached() {
        let client = MockGameClient::new().with_character(snapshot()).with_tile(MapTile {
            x: 0,
            y: 0,
            content: Some(TileContent { content_type: TileContentType::Resource, code: "ash_wood".into() }),
        });
        let mut context = ctx(snapshot());
        context.target = Target::Resource("ash_wood".into());
        context.intermediate.gather_target_quantity = Some(3);
        let action = GatherResourceQuantityAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(agent_planning::get_path(&result.state_changes, "materials.status"), Some(&StateValue::Text("sufficient".into())));
        assert_eq!(context.character.inventory_quantity("ash_wood"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gather_resource_quantity_reports_partial_when_attempts_exhausted() {
        let client = MockGameClient::new().with_character(snapshot());
        let mut context = ctx(snapshot());
        context.target = Target::Resource("ash_wood".into());
        context.intermediate.gather_target_quantity = Some(1000);
        let action = GatherResourceQuantityAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(agent_planning::get_path(&result.state_changes, "materials.status"), Some(&StateValue::Text("partial".into())));
        assert_eq!(context.character.inventory_quantity("raw_material"), MAX_GATHER_ATTEMPTS);
    }

    #[tokio::test]
    async fn gather_resource_quantity_uses_craft_requirements_over_standalone_target() {
        let client = MockGameClient::new().with_character(snapshot()).with_tile(MapTile {
            x: 0,
            y: 0,
            content: Some(TileContent { content_type: TileContentType::Resource, code: "copper_ore".into() }),
        });
        let mut context = ctx(snapshot());
        context.target = Target::Resource("copper_ore".into());
        context.intermediate.craft_requirements = vec![("copper_ore".into(), 1)];
        context.intermediate.gather_target_quantity = Some(50);
        let action = GatherResourceQuantityAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(context.character.inventory_quantity("copper_ore"), 1);
    }
}
