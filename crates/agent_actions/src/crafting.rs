//! Crafting family: resolve what a recipe needs, check it off against
//! inventory, turn raw gathers into intermediate materials, craft the
//! target item, and the parameterized skill-upgrade loop (§4.4).

use crate::context::{ActionContext, Target};
use crate::descriptor::ActionDescriptor;
use crate::result::ActionResult;
use crate::support::{character_state_delta, state};
use agent_client::GameClient;
use agent_planning::{PlanAction, StateMap, StateValue};
use async_trait::async_trait;
use serde_json::json;

pub struct AnalyzeCraftingRequirementsAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl AnalyzeCraftingRequirementsAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("crafting_context.status", "requirements_known".into())]),
        }
    }
}

impl PlanAction for AnalyzeCraftingRequirementsAction {
    fn name(&self) -> &str {
        "analyze_crafting_requirements"
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
impl ActionDescriptor for AnalyzeCraftingRequirementsAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Item(item_code) = ctx.target.clone() else {
            return ActionResult::failure("analyze_crafting_requirements requires an Item target");
        };
        let mut kb = ctx.knowledge.lock().await;
        if kb.get_item(&item_code, Some(client)).await.is_none() {
            return ActionResult::failure(format!("unknown item {item_code}"));
        }
        let requirements = kb.get_material_requirements(&item_code);
        ctx.intermediate.craft_requirements = requirements.into_iter().collect();
        ActionResult::success(
            json!({ "requirements": ctx.intermediate.craft_requirements }),
            state(&[("crafting_context.status", "requirements_known".into())]),
            None,
        )
    }
}

/// Checks gathered/held materials against the requirements resolved by
/// `analyze_crafting_requirements`, branching the plan toward either a
/// direct craft or a gathering detour.
pub struct PlanCraftingMaterialsAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl PlanCraftingMaterialsAction {
    pub fn new() -> Self {
        Self {
            preconditions: state(&[("crafting_context.status", "requirements_known".into())]),
            effects: state(&[("crafting_context.status", StateValue::Pending)]),
        }
    }
}

impl PlanAction for PlanCraftingMaterialsAction {
    fn name(&self) -> &str {
        "plan_crafting_materials"
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
impl ActionDescriptor for PlanCraftingMaterialsAction {
    async fn execute(&self, _client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let missing: Vec<&(String, u32)> = ctx
            .intermediate
            .craft_requirements
            .iter()
            .filter(|(code, quantity)| ctx.character.inventory_quantity(code) < *quantity)
            .collect();
        let status = if missing.is_empty() { "materials_ready" } else { "materials_missing" };
        ActionResult::success(
            json!({ "missing": missing.iter().map(|(c, q)| json!({ "code": c, "quantity": q })).collect::<Vec<_>>() }),
            state(&[("crafting_context.status", status.into())]),
            None,
        )
    }
}

/// Converts a held raw material into the refined intermediate a recipe
/// needs, e.g. `copper_ore` into `copper_bar` (§4.3: recipes are
/// non-recursive, so this is a single refinement hop, not a dependency
/// walk).
pub struct TransformRawMaterialsAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl TransformRawMaterialsAction {
    pub fn new() -> Self {
        Self {
            preconditions: state(&[("crafting_context.status", "materials_missing".into())]),
            effects: state(&[("crafting_context.status", "materials_ready".into())]),
        }
    }
}

impl PlanAction for TransformRawMaterialsAction {
    fn name(&self) -> &str {
        "transform_raw_materials"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        20.0
    }
}

#[async_trait]
impl ActionDescriptor for TransformRawMaterialsAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let intermediate = ctx
            .intermediate
            .craft_requirements
            .iter()
            .find(|(code, quantity)| ctx.character.inventory_quantity(code) < *quantity)
            .map(|(code, _)| code.clone());
        let Some(intermediate_code) = intermediate else {
            return ActionResult::failure("no missing material to transform");
        };
        let needs_refinement = {
            let mut kb = ctx.knowledge.lock().await;
            kb.get_item(&intermediate_code, Some(client)).await.and_then(|item| item.craft.clone()).is_some()
        };
        if !needs_refinement {
            return ActionResult::failure(format!("{intermediate_code} has no recipe to transform into"));
        }
        match client.craft(&ctx.character.name, &intermediate_code, 1).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                ActionResult::success(
                    json!({ "produced": result.items_produced }),
                    character_state_delta(&ctx.character),
                    Some(result.cooldown_seconds),
                )
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

pub struct CraftItemAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl CraftItemAction {
    pub fn new() -> Self {
        Self {
            preconditions: state(&[
                ("crafting_context.status", "materials_ready".into()),
                ("crafting_context.at_workshop", true.into()),
            ]),
            effects: state(&[("crafting_context.status", "crafted".into())]),
        }
    }
}

impl PlanAction for CraftItemAction {
    fn name(&self) -> &str {
        "craft_item"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        20.0
    }
}

#[async_trait]
impl ActionDescriptor for CraftItemAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Item(item_code) = ctx.target.clone() else {
            return ActionResult::failure("craft_item requires an Item target");
        };
        match client.craft(&ctx.character.name, &item_code, 1).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                let mut changes = character_state_delta(&ctx.character);
                agent_planning::merge(&mut changes, &state(&[("crafting_context.status", "crafted".into())]));
                ActionResult::success(
                    json!({ "produced": result.items_produced, "consumed": result.items_consumed }),
                    changes,
                    Some(result.cooldown_seconds),
                )
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

pub struct AnalyzeCraftingChainAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl AnalyzeCraftingChainAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("crafting_context.status", "chain_known".into())]),
        }
    }
}

impl PlanAction for AnalyzeCraftingChainAction {
    fn name(&self) -> &str {
        "analyze_crafting_chain"
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
impl ActionDescriptor for AnalyzeCraftingChainAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Item(item_code) = ctx.target.clone() else {
            return ActionResult::failure("analyze_crafting_chain requires an Item target");
        };
        let mut kb = ctx.knowledge.lock().await;
        let mut chain = Vec::new();
        let mut frontier = vec![item_code.clone()];
        let mut visited = std::collections::HashSet::new();
        while let Some(code) = frontier.pop() {
            if !visited.insert(code.clone()) {
                continue;
            }
            let Some(item) = kb.get_item(&code, Some(client)).await else { continue };
            for (material_code, quantity) in item.material_requirements() {
                chain.push((code.clone(), material_code.clone(), quantity));
                frontier.push(material_code);
            }
        }
        ActionResult::success(
            json!({ "chain": chain.iter().map(|(p, m, q)| json!({ "parent": p, "material": m, "quantity": q })).collect::<Vec<_>>() }),
            state(&[("crafting_context.status", "chain_known".into())]),
            None,
        )
    }
}

/// One struct parameterized by skill name, registered once per craftable
/// skill (Open Questions §9: a single `upgrade_<skill>_skill` family
/// rather than eight hand-written duplicates).
pub struct UpgradeSkillAction {
    skill: String,
    name: String,
    preconditions: StateMap,
    effects: StateMap,
}

impl UpgradeSkillAction {
    pub fn new(skill: impl Into<String>) -> Self {
        let skill = skill.into();
        let effects_key = format!("skills.{skill}");
        Self {
            name: format!("upgrade_{skill}_skill"),
            preconditions: state(&[("crafting_context.status", "crafted".into())]),
            effects: state(&[(effects_key.as_str(), StateValue::Pending)]),
            skill,
        }
    }
}

impl PlanAction for UpgradeSkillAction {
    fn name(&self) -> &str {
        &self.name
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        30.0
    }
}

#[async_trait]
impl ActionDescriptor for UpgradeSkillAction {
    async fn execute(&self, _client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let level = ctx.character.skills.get(&self.skill).unwrap_or(0);
        let effects_key = format!("skills.{}", self.skill);
        ActionResult::success(
            json!({ "skill": self.skill, "level": level }),
            state(&[(effects_key.as_str(), (level as f64).into())]),
            None,
        )
    }
}
