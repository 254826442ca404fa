//! Learned wrappers around `agent_client`'s raw entity DTOs. The raw data
//! (level, hp, drops, craft recipe) comes from the server once and rarely
//! changes; everything in this module is the part the agent accumulates
//! over a session — combat outcomes, discovered locations, win rate.

use agent_client::{CraftData, DropRate, ElementalStats, ItemType, Position};
use serde::{Deserialize, Serialize};

/// Default number of combat samples required before a monster's win rate
/// is trusted (§3.2).
pub const MINIMUM_COMBAT_RESULTS: usize = 2;

/// Default policy for engaging a monster with fewer than
/// `MINIMUM_COMBAT_RESULTS` samples: only if its level is within this many
/// levels of the character's.
pub const UNKNOWN_MONSTER_MAX_LEVEL_DELTA: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSample {
    pub result: CombatOutcome,
    pub hp_lost: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub code: String,
    pub level: u32,
    pub hp: i32,
    pub attack: ElementalStats,
    pub resistance: ElementalStats,
    pub drops: Vec<DropRate>,
    pub discovered_locations: Vec<Position>,
    pub combat_history: Vec<CombatSample>,
}

impl MonsterRecord {
    pub fn from_data(data: agent_client::MonsterData) -> Self {
        Self {
            code: data.code,
            level: data.level,
            hp: data.hp,
            attack: data.attack,
            resistance: data.resistance,
            drops: data.drops,
            discovered_locations: Vec::new(),
            combat_history: Vec::new(),
        }
    }

    /// `None` while under `MINIMUM_COMBAT_RESULTS` samples — the monster
    /// is classified `unknown`, not "0% win rate".
    pub fn win_rate(&self) -> Option<f64> {
        if self.combat_history.len() < MINIMUM_COMBAT_RESULTS {
            return None;
        }
        let wins = self.combat_history.iter().filter(|s| s.result == CombatOutcome::Win).count();
        Some(wins as f64 / self.combat_history.len() as f64)
    }

    /// Whether the agent should risk a fight, per the unknown-monster
    /// policy when there isn't yet enough combat history.
    pub fn is_engageable(&self, character_level: u32) -> bool {
        match self.win_rate() {
            Some(rate) => rate > 0.0,
            None => {
                let delta = self.level as i64 - character_level as i64;
                delta <= UNKNOWN_MONSTER_MAX_LEVEL_DELTA
            }
        }
    }

    pub fn record_combat(&mut self, outcome: CombatOutcome, hp_lost: i32) {
        self.combat_history.push(CombatSample { result: outcome, hp_lost });
    }

    pub fn record_location(&mut self, position: Position) {
        if !self.discovered_locations.contains(&position) {
            self.discovered_locations.push(position);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub code: String,
    pub skill: String,
    pub level: u32,
    pub drops: Vec<DropRate>,
    pub discovered_locations: Vec<Position>,
    /// Locations ranked by some externally-applied desirability (distance,
    /// yield); may be pruned, unlike `discovered_locations` (§3.2).
    pub best_locations: Vec<Position>,
}

impl ResourceRecord {
    pub fn from_data(data: agent_client::ResourceData) -> Self {
        Self {
            code: data.code,
            skill: data.skill,
            level: data.level,
            drops: data.drops,
            discovered_locations: Vec::new(),
            best_locations: Vec::new(),
        }
    }

    pub fn drops_material(&self, material_code: &str) -> bool {
        self.drops.iter().any(|d| d.code == material_code)
    }

    pub fn record_location(&mut self, position: Position) {
        if !self.discovered_locations.contains(&position) {
            self.discovered_locations.push(position);
        }
    }

    /// Keeps at most `max` best locations, nearest to `from` first.
    pub fn prune_best_locations(&mut self, from: Position, max: usize) {
        let mut candidates = self.discovered_locations.clone();
        candidates.sort_by_key(|p| from.chebyshev_distance(p));
        candidates.truncate(max);
        self.best_locations = candidates;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub code: String,
    pub name: String,
    pub item_type: ItemType,
    pub level: u32,
    pub effects: Vec<String>,
    pub craft: Option<CraftData>,
}

impl ItemRecord {
    pub fn from_data(data: agent_client::ItemData) -> Self {
        Self {
            code: data.code,
            name: data.name,
            item_type: data.item_type,
            level: data.level,
            effects: data.effects,
            craft: data.craft,
        }
    }

    /// Material requirements for one craft, non-recursive (§4.3).
    pub fn material_requirements(&self) -> Vec<(String, u32)> {
        self.craft
            .as_ref()
            .map(|c| c.items.iter().map(|m| (m.code.clone(), m.quantity)).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopRecord {
    pub code: String,
    pub skill: String,
    pub locations: Vec<Position>,
}

impl WorkshopRecord {
    pub fn new(code: String, skill: String) -> Self {
        Self { code, skill, locations: Vec::new() }
    }

    pub fn record_location(&mut self, position: Position) {
        if !self.locations.contains(&position) {
            self.locations.push(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monster(level: u32) -> MonsterRecord {
        MonsterRecord {
            code: "chicken".into(),
            level,
            hp: 10,
            attack: ElementalStats::default(),
            resistance: ElementalStats::default(),
            drops: Vec::new(),
            discovered_locations: Vec::new(),
            combat_history: Vec::new(),
        }
    }

    #[test]
    fn unknown_monster_under_level_cap_is_engageable() {
        let m = monster(1);
        assert!(m.is_engageable(3));
    }

    #[test]
    fn unknown_monster_above_level_cap_is_not_engageable() {
        let m = monster(10);
        assert!(!m.is_engageable(3));
    }

    #[test]
    fn win_rate_is_none_below_minimum_samples() {
        let mut m = monster(1);
        m.record_combat(CombatOutcome::Win, 5);
        assert_eq!(m.win_rate(), None);
        m.record_combat(CombatOutcome::Win, 5);
        assert_eq!(m.win_rate(), Some(1.0));
    }

    #[test]
    fn record_location_deduplicates() {
        let mut m = monster(1);
        m.record_location(Position::new(1, 1));
        m.record_location(Position::new(1, 1));
        assert_eq!(m.discovered_locations.len(), 1);
    }
}
