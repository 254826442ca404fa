//! Accumulated entity knowledge: combat outcomes, drops, recipes,
//! discovered locations (§4.3). Fetches unknown entities from a
//! [`GameClient`] on first access and caches the learned wrapper from then
//! on — entities are never deleted, only merged into.

use crate::map_cache::MapCache;
use crate::persistence::{load_if_present, save_atomic};
use crate::records::{CombatOutcome, ItemRecord, MonsterRecord, ResourceRecord, WorkshopRecord};
use agent_client::{CharacterSnapshot, EquipmentSlot, GameClient, Position};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KnowledgeData {
    monsters: BTreeMap<String, MonsterRecord>,
    resources: BTreeMap<String, ResourceRecord>,
    items: BTreeMap<String, ItemRecord>,
    workshops: BTreeMap<String, WorkshopRecord>,
    /// Codes the server has confirmed do not exist, so repeated lookups
    /// short-circuit instead of re-querying (§7 NotFound handling).
    not_found: BTreeMap<String, ()>,
}

pub struct KnowledgeBase {
    data: KnowledgeData,
    path: Option<PathBuf>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self { data: KnowledgeData::default(), path: None }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = load_if_present(&path)?.unwrap_or_default();
        Ok(Self { data, path: Some(path) })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            save_atomic(path, &self.data)?;
        }
        Ok(())
    }

    fn not_found_key(kind: &str, code: &str) -> String {
        format!("{kind}:{code}")
    }

    pub async fn get_monster(&mut self, code: &str, client: Option<&dyn GameClient>) -> Option<&MonsterRecord> {
        if !self.data.monsters.contains_key(code) {
            self.fetch_monster(code, client).await;
        }
        self.data.monsters.get(code)
    }

    async fn fetch_monster(&mut self, code: &str, client: Option<&dyn GameClient>) {
        let key = Self::not_found_key("monster", code);
        if self.data.not_found.contains_key(&key) {
            return;
        }
        if let Some(client) = client {
            match client.get_monster(code).await {
                Ok(raw) => {
                    self.data.monsters.insert(code.to_string(), MonsterRecord::from_data(raw));
                }
                Err(_) => {
                    self.data.not_found.insert(key, ());
                }
            }
        }
    }

    pub async fn get_resource(&mut self, code: &str, client: Option<&dyn GameClient>) -> Option<&ResourceRecord> {
        if !self.data.resources.contains_key(code) {
            let key = Self::not_found_key("resource", code);
            if !self.data.not_found.contains_key(&key) {
                if let Some(client) = client {
                    match client.get_resource(code).await {
                        Ok(raw) => {
                            self.data.resources.insert(code.to_string(), ResourceRecord::from_data(raw));
                        }
                        Err(_) => {
                            self.data.not_found.insert(key, ());
                        }
                    }
                }
            }
        }
        self.data.resources.get(code)
    }

    pub async fn get_item(&mut self, code: &str, client: Option<&dyn GameClient>) -> Option<&ItemRecord> {
        if !self.data.items.contains_key(code) {
            let key = Self::not_found_key("item", code);
            if !self.data.not_found.contains_key(&key) {
                if let Some(client) = client {
                    match client.get_item(code).await {
                        Ok(raw) => {
                            self.data.items.insert(code.to_string(), ItemRecord::from_data(raw));
                        }
                        Err(_) => {
                            self.data.not_found.insert(key, ());
                        }
                    }
                }
            }
        }
        self.data.items.get(code)
    }

    pub fn get_workshop(&self, code: &str) -> Option<&WorkshopRecord> {
        self.data.workshops.get(code)
    }

    pub fn learn_combat(&mut self, monster_code: &str, outcome: CombatOutcome, hp_lost: i32) {
        if let Some(record) = self.data.monsters.get_mut(monster_code) {
            record.record_combat(outcome, hp_lost);
        }
    }

    /// Appends a discovered location for any entity kind; no-op if the
    /// entity is not yet known (learning locations implies the entity's
    /// base data was already fetched).
    pub fn learn_location(&mut self, entity_code: &str, position: Position) {
        if let Some(record) = self.data.monsters.get_mut(entity_code) {
            record.record_location(position);
        } else if let Some(record) = self.data.resources.get_mut(entity_code) {
            record.record_location(position);
        } else if let Some(record) = self.data.workshops.get_mut(entity_code) {
            record.record_location(position);
        }
    }

    pub fn learn_workshop(&mut self, code: &str, skill: &str, position: Position) {
        let record = self
            .data
            .workshops
            .entry(code.to_string())
            .or_insert_with(|| WorkshopRecord::new(code.to_string(), skill.to_string()));
        record.record_location(position);
    }

    /// Reverse index: resources whose drops include `material_code`.
    pub fn find_resources_for_material(&self, material_code: &str) -> Vec<String> {
        self.data
            .resources
            .values()
            .filter(|r| r.drops_material(material_code))
            .map(|r| r.code.clone())
            .collect()
    }

    /// Joins resource records with the map cache for the given candidate
    /// `codes`, returning matches within `max_radius` of `center`, nearest
    /// first.
    pub fn find_resources_in_map(
        &self,
        codes: &[String],
        center: Position,
        max_radius: u32,
        map_cache: &MapCache,
    ) -> Vec<(Position, String)> {
        let mut found = Vec::new();
        for code in codes {
            let Some(record) = self.data.resources.get(code) else { continue };
            for location in &record.discovered_locations {
                if center.chebyshev_distance(location) > max_radius {
                    continue;
                }
                if map_cache.get(location.x, location.y, false).is_some() {
                    found.push((*location, code.clone()));
                }
            }
        }
        found.sort_by_key(|(pos, _)| center.chebyshev_distance(pos));
        found
    }

    /// Material requirements from `item_code`'s craft recipe. Non-recursive
    /// (§4.3) — callers wanting a full dependency tree iterate with a
    /// visited set themselves (§9).
    pub fn get_material_requirements(&self, item_code: &str) -> BTreeMap<String, u32> {
        self.data
            .items
            .get(item_code)
            .map(|item| item.material_requirements().into_iter().collect())
            .unwrap_or_default()
    }

    /// Checks inventory and equipment slots for `item_code` (§4.3). This is
    /// a heuristic capability: it reads the live snapshot, never a
    /// persisted flag.
    pub fn has_target_item(snapshot: &CharacterSnapshot, item_code: &str) -> bool {
        if snapshot.inventory_quantity(item_code) > 0 {
            return true;
        }
        EquipmentSlot::ALL.into_iter().any(|slot| snapshot.equipment.get(slot) == Some(item_code))
    }

    /// Whether `snapshot`'s position matches a known location of the
    /// workshop for `skill`.
    pub fn is_at_workshop(&self, snapshot: &CharacterSnapshot, skill: &str) -> bool {
        self.data
            .workshops
            .values()
            .filter(|w| w.skill == skill)
            .any(|w| w.locations.iter().any(|loc| *loc == snapshot.position()))
    }

    /// Whether `snapshot`'s position matches a known location of a
    /// resource that drops `material_code`.
    pub fn is_at_resource_location(&self, snapshot: &CharacterSnapshot, material_code: &str) -> bool {
        self.data
            .resources
            .values()
            .filter(|r| r.drops_material(material_code))
            .any(|r| r.discovered_locations.iter().any(|loc| *loc == snapshot.position()))
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_client::mock::MockGameClient;
    use agent_client::{DropRate, ElementalStats, MonsterData, ResourceData, SkillLevels};

    fn snapshot_at(x: i32, y: i32) -> CharacterSnapshot {
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

    #[tokio::test]
    async fn fetches_unknown_monster_once_then_serves_from_cache() {
        let client = MockGameClient::new().with_monster(MonsterData {
            code: "chicken".into(),
            level: 1,
            hp: 10,
            attack: ElementalStats::default(),
            resistance: ElementalStats::default(),
            drops: Vec::new(),
        });
        let mut kb = KnowledgeBase::new();
        let record = kb.get_monster("chicken", Some(&client)).await;
        assert!(record.is_some());
        // second call should not need the client at all; pass None.
        let record = kb.get_monster("chicken", None).await;
        assert!(record.is_some());
    }

    #[tokio::test]
    async fn not_found_entity_is_not_requeried() {
        let client = MockGameClient::new();
        let mut kb = KnowledgeBase::new();
        assert!(kb.get_monster("ghost", Some(&client)).await.is_none());
        // a second lookup must short-circuit via not_found, not error again.
        assert!(kb.get_monster("ghost", Some(&client)).await.is_none());
    }

    #[test]
    fn find_resources_for_material_reverse_indexes_drops() {
        let mut kb = KnowledgeBase::new();
        kb.data.resources.insert(
            "copper_rocks".into(),
            ResourceRecord::from_data(ResourceData {
                code: "copper_rocks".into(),
                skill: "mining".into(),
                level: 1,
                drops: vec![DropRate { code: "copper_ore".into(), rate: 100, min_quantity: 1, max_quantity: 1 }],
            }),
        );
        assert_eq!(kb.find_resources_for_material("copper_ore"), vec!["copper_rocks".to_string()]);
    }

    #[test]
    fn has_target_item_checks_inventory_and_equipment() {
        let mut snapshot = snapshot_at(0, 0);
        snapshot.equipment.weapon = Some("wooden_staff".into());
        assert!(KnowledgeBase::has_target_item(&snapshot, "wooden_staff"));
        assert!(!KnowledgeBase::has_target_item(&snapshot, "iron_sword"));
    }

    #[test]
    fn is_at_workshop_matches_known_location() {
        let mut kb = KnowledgeBase::new();
        kb.learn_workshop("weaponcrafting_shop", "weaponcrafting", Position::new(2, 2));
        assert!(kb.is_at_workshop(&snapshot_at(2, 2), "weaponcrafting"));
        assert!(!kb.is_at_workshop(&snapshot_at(0, 0), "weaponcrafting"));
    }
}
