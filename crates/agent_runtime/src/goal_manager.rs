//! Selects the active goal predicate each loop iteration (§4.7): an
//! ordered list of goal templates, each gated on current character state,
//! the first satisfied-and-unmet template wins.

use agent_actions::support::{character_state_delta, set_path};
use agent_client::{CharacterSnapshot, EquipmentSlot};
use agent_planning::{matches, StateMap};

/// Externally-configured targets the default templates chase. Any field
/// left at its default (`None` / empty) disables that template.
#[derive(Debug, Clone, Default)]
pub struct GoalTargets {
    pub target_gold: Option<u32>,
    pub skill_target: Option<(String, u32)>,
    pub equipment_targets: Vec<(EquipmentSlot, String)>,
    /// Fraction of max HP below which the rest-and-heal goal takes over,
    /// regardless of any other template (§4.7 example).
    pub critical_hp_fraction: f64,
}

impl GoalTargets {
    pub fn new() -> Self {
        Self { critical_hp_fraction: 0.3, ..Default::default() }
    }
}

struct GoalTemplate {
    name: &'static str,
    goal: StateMap,
}

/// Builds the full state view goal predicates are matched against:
/// `character_state_delta` plus level, gold, skills, and equipment — the
/// parts of [`CharacterSnapshot`] the default templates need that the
/// action layer's minimal delta omits.
pub fn character_full_state(character: &CharacterSnapshot) -> StateMap {
    let mut state = character_state_delta(character);
    set_path(&mut state, "character_status.level", (character.level as f64).into());
    set_path(&mut state, "character_status.gold", (character.gold as f64).into());
    for slot in EquipmentSlot::ALL {
        if let Some(code) = character.equipment.get(slot) {
            set_path(&mut state, &format!("equipment.{}", slot.as_str()), code.into());
        }
    }
    for skill in agent_actions::UPGRADABLE_SKILLS {
        if let Some(level) = character.skills.get(skill) {
            set_path(&mut state, &format!("skills.{skill}"), (level as f64).into());
        }
    }
    state
}

/// Ordered goal templates, gated and built fresh from the live character
/// snapshot each call (§4.7: "the manager maintains an ordered list of
/// goal templates").
pub struct GoalManager {
    targets: GoalTargets,
}

impl GoalManager {
    pub fn new(targets: GoalTargets) -> Self {
        Self { targets }
    }

    fn templates(&self, character: &CharacterSnapshot) -> Vec<GoalTemplate> {
        let mut templates = Vec::new();

        let hp_fraction = character.hp as f64 / character.max_hp.max(1) as f64;
        if hp_fraction < self.targets.critical_hp_fraction {
            let mut goal = StateMap::new();
            set_path(&mut goal, "character_status.hp", format!(">={}", character.max_hp).into());
            templates.push(GoalTemplate { name: "rest_and_heal", goal });
        }

        for (slot, item_code) in &self.targets.equipment_targets {
            let mut goal = StateMap::new();
            set_path(&mut goal, &format!("equipment.{}", slot.as_str()), item_code.clone().into());
            templates.push(GoalTemplate { name: "achieve_equipment_set", goal });
        }

        if let Some((skill, level)) = &self.targets.skill_target {
            let mut goal = StateMap::new();
            set_path(&mut goal, &format!("skills.{skill}"), format!(">={level}").into());
            templates.push(GoalTemplate { name: "reach_skill_threshold", goal });
        }

        if let Some(gold) = self.targets.target_gold {
            let mut goal = StateMap::new();
            set_path(&mut goal, "character_status.gold", format!(">={gold}").into());
            templates.push(GoalTemplate { name: "accumulate_gold", goal });
        }

        // Always-eligible fallback: keep leveling past whatever the
        // character's current level is, so the loop always has a goal.
        let mut goal = StateMap::new();
        set_path(&mut goal, "character_status.level", format!(">={}", character.level + 1).into());
        templates.push(GoalTemplate { name: "level_up", goal });

        templates
    }

    /// The first template whose goal the current state does not already
    /// satisfy. Recomputed every call, so a just-met goal (e.g. HP
    /// restored) falls through to the next template without the caller
    /// tracking completion itself.
    pub fn next_goal(&self, character: &CharacterSnapshot) -> (&'static str, StateMap) {
        let state = character_full_state(character);
        for template in self.templates(character) {
            if !matches(&state, &template.goal) {
                return (template.name, template.goal);
            }
        }
        // Every template is currently met (shouldn't happen: `level_up`'s
        // target always sits one above the current level) — fall back to
        // levelling again rather than returning no goal.
        let mut goal = StateMap::new();
        set_path(&mut goal, "character_status.level", format!(">={}", character.level + 1).into());
        ("level_up", goal)
    }
}

impl Default for GoalManager {
    fn default() -> Self {
        Self::new(GoalTargets::new())
    }
}
