//! Concrete action catalogue: binds `agent_planning`'s preconditions /
//! effects / weight metadata to a live `execute(client, context)` body
//! against `agent_client` and `agent_world` (§4.4).

pub mod combat;
pub mod context;
pub mod crafting;
pub mod descriptor;
pub mod equipment;
pub mod gathering;
pub mod knowledge;
pub mod movement;
pub mod registry;
pub mod result;
pub mod support;

pub use context::{ActionContext, IntermediateResults, SearchParams, Target};
pub use descriptor::ActionDescriptor;
pub use registry::ActionRegistry;
pub use result::ActionResult;

/// Skills that have an `upgrade_<skill>_skill` action — crafting and
/// gathering skills, mirroring `agent_client::SkillLevels`'s fields.
pub const UPGRADABLE_SKILLS: [&str; 8] =
    ["mining", "woodcutting", "fishing", "weaponcrafting", "gearcrafting", "jewelrycrafting", "cooking", "alchemy"];

/// Builds the full action catalogue (§4.4: "≥ 30 concrete actions").
/// Called once at process start; the registry is read-only afterward.
pub fn build_default_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();

    registry.register(Box::new(combat::AttackAction::new()));
    registry.register(Box::new(combat::RestAction::new()));
    registry.register(Box::new(combat::InitiateCombatSearchAction::new()));
    registry.register(Box::new(combat::FindMonstersAction::new()));
    registry.register(Box::new(combat::AnalyzeCombatViabilityAction::new()));

    registry.register(Box::new(movement::MoveAction::new()));
    registry.register(Box::new(movement::MoveToResourceAction::new()));
    registry.register(Box::new(movement::MoveToWorkshopAction::new()));

    registry.register(Box::new(crafting::PlanCraftingMaterialsAction::new()));
    registry.register(Box::new(crafting::CraftItemAction::new()));
    registry.register(Box::new(crafting::AnalyzeCraftingChainAction::new()));
    registry.register(Box::new(crafting::AnalyzeCraftingRequirementsAction::new()));
    registry.register(Box::new(crafting::TransformRawMaterialsAction::new()));
    for skill in UPGRADABLE_SKILLS {
        registry.register(Box::new(crafting::UpgradeSkillAction::new(skill)));
    }

    registry.register(Box::new(gathering::GatherResourcesAction::new()));
    registry.register(Box::new(gathering::GatherResourceQuantityAction::new()));
    registry.register(Box::new(gathering::FindResourcesAction::new()));
    registry.register(Box::new(gathering::FindWorkshopsAction::new()));

    registry.register(Box::new(equipment::EquipItemAction::new()));
    registry.register(Box::new(equipment::UnequipItemAction::new()));
    registry.register(Box::new(equipment::AnalyzeEquipmentAction::new()));
    registry.register(Box::new(equipment::FindXpSourcesAction::new()));

    registry.register(Box::new(knowledge::MapLookupAction::new()));
    registry.register(Box::new(knowledge::LookupItemInfoAction::new()));
    registry.register(Box::new(knowledge::ExploreMapAction::new()));
    registry.register(Box::new(knowledge::AnalyzeKnowledgeStateAction::new()));

    registry
}
