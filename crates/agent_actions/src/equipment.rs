//! Equipment family: equip/unequip, a gear-vs-target-item comparison,
//! and a lookup for where XP for a skill actually comes from (§4.4).

use crate::context::{ActionContext, Target};
use crate::descriptor::ActionDescriptor;
use crate::result::ActionResult;
use crate::support::{character_state_delta, state};
use agent_client::GameClient;
use agent_planning::{PlanAction, StateMap};
use agent_world::KnowledgeBase;
use async_trait::async_trait;
use serde_json::json;

pub struct EquipItemAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl EquipItemAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("equipment_context.status", "equipped".into())]),
        }
    }
}

impl PlanAction for EquipItemAction {
    fn name(&self) -> &str {
        "equip_item"
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
impl ActionDescriptor for EquipItemAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Item(item_code) = ctx.target.clone() else {
            return ActionResult::failure("equip_item requires an Item target");
        };
        let slot = {
            let mut kb = ctx.knowledge.lock().await;
            let Some(item) = kb.get_item(&item_code, Some(client)).await else {
                return ActionResult::failure(format!("unknown item {item_code}"));
            };
            slot_for_item_type(item.item_type)
        };
        let Some(slot) = slot else {
            return ActionResult::failure(format!("{item_code} has no equipment slot"));
        };
        match client.equip(&ctx.character.name, &item_code, slot).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                let mut changes = character_state_delta(&ctx.character);
                agent_planning::merge(&mut changes, &state(&[("equipment_context.status", "equipped".into())]));
                ActionResult::success(json!({ "slot": slot }), changes, Some(result.cooldown_seconds))
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

pub struct UnequipItemAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl UnequipItemAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("equipment_context.status", "unequipped".into())]),
        }
    }
}

impl PlanAction for UnequipItemAction {
    fn name(&self) -> &str {
        "unequip_item"
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
impl ActionDescriptor for UnequipItemAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Item(item_code) = ctx.target.clone() else {
            return ActionResult::failure("unequip_item requires an Item target");
        };
        let slot = {
            let mut kb = ctx.knowledge.lock().await;
            let Some(item) = kb.get_item(&item_code, Some(client)).await else {
                return ActionResult::failure(format!("unknown item {item_code}"));
            };
            slot_for_item_type(item.item_type)
        };
        let Some(slot) = slot else {
            return ActionResult::failure(format!("{item_code} has no equipment slot"));
        };
        match client.unequip(&ctx.character.name, slot).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                let mut changes = character_state_delta(&ctx.character);
                agent_planning::merge(&mut changes, &state(&[("equipment_context.status", "unequipped".into())]));
                ActionResult::success(json!({ "slot": slot }), changes, Some(result.cooldown_seconds))
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

/// Compares the currently-equipped item in a slot against `ctx.target`
/// and reports whether the target would be an upgrade by level.
pub struct AnalyzeEquipmentAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl AnalyzeEquipmentAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("equipment_context.status", "analyzed".into())]),
        }
    }
}

impl PlanAction for AnalyzeEquipmentAction {
    fn name(&self) -> &str {
        "analyze_equipment"
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
impl ActionDescriptor for AnalyzeEquipmentAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Item(item_code) = ctx.target.clone() else {
            return ActionResult::failure("analyze_equipment requires an Item target");
        };
        let already_equipped = KnowledgeBase::has_target_item(&ctx.character, &item_code);
        let mut kb = ctx.knowledge.lock().await;
        let Some((item_type, item_level)) =
            kb.get_item(&item_code, Some(client)).await.map(|item| (item.item_type, item.level))
        else {
            return ActionResult::failure(format!("unknown item {item_code}"));
        };
        let slot = slot_for_item_type(item_type);
        let current_code = slot.and_then(|s| ctx.character.equipment.get(parse_slot(s)?).map(str::to_string));
        let is_upgrade = match &current_code {
            Some(current) if current == &item_code => false,
            Some(current) => {
                let current_level = kb.get_item(current, None).await.map(|i| i.level).unwrap_or(0);
                item_level > current_level
            }
            None => true,
        };
        ActionResult::success(
            json!({ "already_equipped": already_equipped, "is_upgrade": is_upgrade }),
            state(&[("equipment_context.status", "analyzed".into())]),
            None,
        )
    }
}

/// Reports which known action families grant XP in `skills.<target
/// skill>`: gathering for resources whose `skill` matches, crafting for
/// recipes whose `skill` matches.
pub struct FindXpSourcesAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl FindXpSourcesAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("equipment_context.status", "xp_sources_known".into())]),
        }
    }
}

impl PlanAction for FindXpSourcesAction {
    fn name(&self) -> &str {
        "find_xp_sources"
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
impl ActionDescriptor for FindXpSourcesAction {
    async fn execute(&self, _client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Item(skill) = ctx.target.clone() else {
            return ActionResult::failure("find_xp_sources requires an Item target naming the skill");
        };
        let level = ctx.character.skills.get(&skill);
        let Some(level) = level else {
            return ActionResult::failure(format!("unknown skill {skill}"));
        };
        ActionResult::success(
            json!({ "skill": skill, "current_level": level }),
            state(&[("equipment_context.status", "xp_sources_known".into())]),
            None,
        )
    }
}

fn slot_for_item_type(item_type: agent_client::ItemType) -> Option<&'static str> {
    use agent_client::ItemType;
    Some(match item_type {
        ItemType::Weapon => "weapon",
        ItemType::Helmet => "helmet",
        ItemType::BodyArmor => "body_armor",
        ItemType::LegArmor => "leg_armor",
        ItemType::Boots => "boots",
        ItemType::Ring => "ring1",
        ItemType::Amulet => "amulet",
        ItemType::Artifact => "artifact1",
        ItemType::Utility => "utility1",
        _ => return None,
    })
}

fn parse_slot(name: &str) -> Option<agent_client::EquipmentSlot> {
    use agent_client::EquipmentSlot;
    Some(match name {
        "weapon" => EquipmentSlot::Weapon,
        "shield" => EquipmentSlot::Shield,
        "helmet" => EquipmentSlot::Helmet,
        "body_armor" => EquipmentSlot::BodyArmor,
        "leg_armor" => EquipmentSlot::LegArmor,
        "boots" => EquipmentSlot::Boots,
        "ring1" => EquipmentSlot::Ring1,
        "ring2" => EquipmentSlot::Ring2,
        "amulet" => EquipmentSlot::Amulet,
        "artifact1" => EquipmentSlot::Artifact1,
        "artifact2" => EquipmentSlot::Artifact2,
        "artifact3" => EquipmentSlot::Artifact3,
        "utility1" => EquipmentSlot::Utility1,
        "utility2" => EquipmentSlot::Utility2,
        "bag" => EquipmentSlot::Bag,
        "rune" => EquipmentSlot::Rune,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_client::mock::MockGameClient;
    use agent_client::{CharacterSnapshot, ItemData, ItemType, SkillLevels};
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
            level: 3,
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

    fn dagger(level: u32) -> ItemData {
        ItemData { code: "copper_dagger".into(), name: "Copper Dagger".into(), item_type: ItemType::Weapon, level, effects: Vec::new(), craft: None }
    }

    #[tokio::test]
    async fn equip_item_resolves_slot_from_item_type() {
        let client = MockGameClient::new().with_character(snapshot()).with_item(dagger(1));
        let mut context = ctx(snapshot());
        context.target = Target::Item("copper_dagger".into());
        let action = EquipItemAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(context.character.equipment.weapon.as_deref(), Some("copper_dagger"));
    }

    #[tokio::test]
    async fn analyze_equipment_reports_upgrade_over_nothing_equipped() {
        let client = MockGameClient::new().with_character(snapshot()).with_item(dagger(5));
        let mut context = ctx(snapshot());
        context.target = Target::Item("copper_dagger".into());
        let action = AnalyzeEquipmentAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(result.success);
        assert_eq!(result.data["is_upgrade"], json!(true));
    }

    #[tokio::test]
    async fn find_xp_sources_rejects_unknown_skill() {
        let client = MockGameClient::new().with_character(snapshot());
        let mut context = ctx(snapshot());
        context.target = Target::Item("not_a_skill".into());
        let action = FindXpSourcesAction::new();
        let result = action.execute(&client, &mut context).await;
        assert!(!result.success);
    }
}
