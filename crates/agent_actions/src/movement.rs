//! Movement family: a raw coordinate move, plus the two convenience
//! descriptors that resolve a resource or workshop target to coordinates
//! first (§4.4).

use crate::context::{ActionContext, Target};
use crate::descriptor::ActionDescriptor;
use crate::result::ActionResult;
use crate::support::{character_state_delta, move_character, state};
use agent_client::GameClient;
use agent_planning::{PlanAction, StateMap, StateValue};
use async_trait::async_trait;
use serde_json::json;

pub struct MoveAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl MoveAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("character_status.x", StateValue::Pending), ("character_status.y", StateValue::Pending)]),
        }
    }
}

impl PlanAction for MoveAction {
    fn name(&self) -> &str {
        "move"
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
impl ActionDescriptor for MoveAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Coords(destination) = ctx.target.clone() else {
            return ActionResult::failure("move requires a Coords target");
        };
        match move_character(client, &ctx.character.name, destination.x, destination.y).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                ActionResult::success(
                    json!({ "already_at_destination": result.already_at_destination }),
                    character_state_delta(&ctx.character),
                    Some(result.cooldown_seconds),
                )
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

pub struct MoveToResourceAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl MoveToResourceAction {
    pub fn new() -> Self {
        Self {
            preconditions: state(&[("gathering_context.status", "located".into())]),
            effects: state(&[("character_status.x", StateValue::Pending), ("character_status.y", StateValue::Pending)]),
        }
    }
}

impl PlanAction for MoveToResourceAction {
    fn name(&self) -> &str {
        "move_to_resource"
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
impl ActionDescriptor for MoveToResourceAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let destination = match ctx.intermediate.search_hits.first() {
            Some(pos) => *pos,
            None => return ActionResult::failure("no resource search hits to move toward"),
        };
        match move_character(client, &ctx.character.name, destination.x, destination.y).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                ActionResult::success(
                    json!({ "already_at_destination": result.already_at_destination }),
                    character_state_delta(&ctx.character),
                    Some(result.cooldown_seconds),
                )
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

pub struct MoveToWorkshopAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl MoveToWorkshopAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[
                ("character_status.x", StateValue::Pending),
                ("character_status.y", StateValue::Pending),
                ("crafting_context.at_workshop", true.into()),
            ]),
        }
    }
}

impl PlanAction for MoveToWorkshopAction {
    fn name(&self) -> &str {
        "move_to_workshop"
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
impl ActionDescriptor for MoveToWorkshopAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Item(item_code) = ctx.target.clone() else {
            return ActionResult::failure("move_to_workshop requires an Item target to resolve the crafting skill");
        };
        let skill = {
            let mut kb = ctx.knowledge.lock().await;
            let Some(item) = kb.get_item(&item_code, Some(client)).await else {
                return ActionResult::failure(format!("unknown item {item_code}"));
            };
            let Some(craft) = &item.craft else {
                return ActionResult::failure(format!("{item_code} is not craftable"));
            };
            craft.skill.clone()
        };
        let destination = {
            let kb = ctx.knowledge.lock().await;
            kb.get_workshop(&skill).and_then(|w| w.locations.first().copied())
        };
        let Some(destination) = destination else {
            return ActionResult::failure(format!("no known workshop location for skill {skill}"));
        };
        match move_character(client, &ctx.character.name, destination.x, destination.y).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                let mut changes = character_state_delta(&ctx.character);
                agent_planning::merge(&mut changes, &state(&[("crafting_context.at_workshop", true.into())]));
                ActionResult::success(
                    json!({ "already_at_destination": result.already_at_destination }),
                    changes,
                    Some(result.cooldown_seconds),
                )
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_client::mock::MockGameClient;
    use agent_client::{CharacterSnapshot, Position, SkillLevels};
    use agent_world::{KnowledgeBase, MapCache};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn snapshot(x: i32, y: i32) -> CharacterSnapshot {
        CharacterSnapshot {
            name: "alice".into(),
            x,
            y,
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
    async fn move_to_same_tile_reports_already_at_destination_and_no_position_change() {
        let client = MockGameClient::new().with_character(snapshot(5, 3));
        let mut context = ctx(snapshot(5, 3));
        context.target = Target::Coords(Position::new(5, 3));
        let action = MoveAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(context.character.x, 5);
        assert_eq!(context.character.y, 3);
    }

    #[tokio::test]
    async fn move_without_coords_target_fails_validation() {
        let client = MockGameClient::new().with_character(snapshot(0, 0));
        let mut context = ctx(snapshot(0, 0));
        let action = MoveAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn move_to_resource_uses_first_search_hit() {
        let client = MockGameClient::new().with_character(snapshot(0, 0));
        let mut context = ctx(snapshot(0, 0));
        context.intermediate.search_hits = vec![Position::new(2, 2)];
        let action = MoveToResourceAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(context.character.x, 2);
        assert_eq!(context.character.y, 2);
    }
}
