//! Combat family: attack, rest, and the search/analysis actions that find
//! and vet a monster before engaging it (§4.4).

use crate::context::{ActionContext, Target};
use crate::descriptor::ActionDescriptor;
use crate::result::ActionResult;
use crate::support::{character_state_delta, state};
use agent_client::{FightOutcome, GameClient, TileContentType};
use agent_planning::{PlanAction, StateMap, StateValue};
use agent_world::records::CombatOutcome;
use async_trait::async_trait;
use serde_json::json;

pub struct AttackAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl AttackAction {
    pub fn new() -> Self {
        Self {
            preconditions: state(&[("combat_context.status", "ready".into())]),
            effects: state(&[("combat_context.status", "resolved".into()), ("combat_context.outcome", StateValue::Pending)]),
        }
    }
}

impl PlanAction for AttackAction {
    fn name(&self) -> &str {
        "attack"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        12.0
    }
}

#[async_trait]
impl ActionDescriptor for AttackAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Monster(monster_code) = ctx.target.clone() else {
            return ActionResult::failure("attack requires a Monster target");
        };
        match client.attack(&ctx.character.name).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                {
                    let mut kb = ctx.knowledge.lock().await;
                    let combat_outcome = match result.outcome {
                        FightOutcome::Win => CombatOutcome::Win,
                        FightOutcome::Loss => CombatOutcome::Loss,
                    };
                    kb.learn_combat(&monster_code, combat_outcome, result.hp_lost);
                }
                let mut changes = character_state_delta(&ctx.character);
                agent_planning::merge(
                    &mut changes,
                    &state(&[
                        ("combat_context.status", "resolved".into()),
                        (
                            "combat_context.outcome",
                            match result.outcome {
                                FightOutcome::Win => "win",
                                FightOutcome::Loss => "loss",
                            }
                            .into(),
                        ),
                    ]),
                );
                ActionResult::success(
                    json!({ "outcome": format!("{:?}", result.outcome), "hp_lost": result.hp_lost }),
                    changes,
                    Some(result.cooldown_seconds),
                )
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

pub struct RestAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl RestAction {
    pub fn new() -> Self {
        Self {
            preconditions: state(&[("character_status.alive", true.into())]),
            effects: state(&[("character_status.hp", StateValue::Pending)]),
        }
    }
}

impl PlanAction for RestAction {
    fn name(&self) -> &str {
        "rest"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        1.0
    }
}

#[async_trait]
impl ActionDescriptor for RestAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        match client.rest(&ctx.character.name).await {
            Ok(result) => {
                ctx.character = result.character.clone();
                let changes = character_state_delta(&ctx.character);
                ActionResult::success(json!({ "hp_restored": result.hp_restored }), changes, Some(result.cooldown_seconds))
            }
            Err(e) => ActionResult::failure(e.to_string()),
        }
    }
}

pub struct InitiateCombatSearchAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl InitiateCombatSearchAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("combat_context.status", "searching".into())]),
        }
    }
}

impl PlanAction for InitiateCombatSearchAction {
    fn name(&self) -> &str {
        "initiate_combat_search"
    }
    fn preconditions(&self) -> &StateMap {
        &self.preconditions
    }
    fn effects(&self) -> &StateMap {
        &self.effects
    }
    fn weight(&self) -> f64 {
        2.0
    }
}

#[async_trait]
impl ActionDescriptor for InitiateCombatSearchAction {
    async fn execute(&self, _client: &dyn GameClient, _ctx: &mut ActionContext) -> ActionResult {
        ActionResult::success(json!({}), state(&[("combat_context.status", "searching".into())]), None)
    }
}

pub struct FindMonstersAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl FindMonstersAction {
    pub fn new() -> Self {
        Self {
            preconditions: state(&[("combat_context.status", "searching".into())]),
            effects: state(&[("combat_context.status", "located".into())]),
        }
    }
}

impl PlanAction for FindMonstersAction {
    fn name(&self) -> &str {
        "find_monsters"
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
impl ActionDescriptor for FindMonstersAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Monster(monster_code) = ctx.target.clone() else {
            return ActionResult::failure("find_monsters requires a Monster target");
        };
        let center = ctx.character.position();
        let radius = ctx.search.radius;
        let nearest_only = ctx.search.nearest_only;
        let mut map = ctx.map.lock().await;
        let hits = match map
            .search(client, center, radius, |c| c.content_type == TileContentType::Monster && c.code == monster_code, nearest_only)
            .await
        {
            Ok(hits) => hits,
            Err(e) => return ActionResult::failure(e.to_string()),
        };
        drop(map);
        if hits.is_empty() {
            return ActionResult::failure(format!("no {monster_code} found within radius {radius}"));
        }
        let nearest = hits[0].clone();
        {
            let mut kb = ctx.knowledge.lock().await;
            kb.learn_location(&monster_code, agent_client::Position::new(nearest.x, nearest.y));
        }
        ctx.intermediate.search_hits = hits.iter().map(|t| agent_client::Position::new(t.x, t.y)).collect();
        ctx.target = Target::Coords(agent_client::Position::new(nearest.x, nearest.y));
        ActionResult::success(
            json!({ "location": { "x": nearest.x, "y": nearest.y } }),
            state(&[("combat_context.status", "located".into())]),
            None,
        )
    }
}

pub struct AnalyzeCombatViabilityAction {
    preconditions: StateMap,
    effects: StateMap,
}

impl AnalyzeCombatViabilityAction {
    pub fn new() -> Self {
        Self {
            preconditions: StateMap::new(),
            effects: state(&[("combat_context.status", "viable".into())]),
        }
    }
}

impl PlanAction for AnalyzeCombatViabilityAction {
    fn name(&self) -> &str {
        "analyze_combat_viability"
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
impl ActionDescriptor for AnalyzeCombatViabilityAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult {
        let Target::Monster(monster_code) = ctx.target.clone() else {
            return ActionResult::failure("analyze_combat_viability requires a Monster target");
        };
        let mut kb = ctx.knowledge.lock().await;
        let Some(record) = kb.get_monster(&monster_code, Some(client)).await else {
            return ActionResult::failure(format!("unknown monster {monster_code}"));
        };
        let engageable = record.is_engageable(ctx.character.level);
        let status = if engageable { "ready" } else { "not_viable" };
        ActionResult::success(
            json!({ "engageable": engageable }),
            state(&[("combat_context.status", status.into())]),
            None,
        )
    }
}
