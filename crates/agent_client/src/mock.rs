//! In-memory [`GameClient`] for tests in this crate and downstream crates.
//! State lives behind a `Mutex` so a single `MockGameClient` can be shared
//! across an `Arc` the way the real HTTP client is shared.

use crate::client::GameClient;
use crate::error::GameError;
use crate::types::{
    CharacterSnapshot, CraftResult, EquipResult, FightOutcome, FightResult, GatherResult,
    InventorySlot, ItemData, MapTile, MonsterData, MoveResult, ResourceData, RestResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockGameClient {
    characters: Mutex<HashMap<String, CharacterSnapshot>>,
    tiles: Mutex<HashMap<(i32, i32), MapTile>>,
    items: Mutex<HashMap<String, ItemData>>,
    monsters: Mutex<HashMap<String, MonsterData>>,
    resources: Mutex<HashMap<String, ResourceData>>,
    /// Queued outcome for the next `attack()` call; defaults to a win with
    /// no hp lost when empty.
    next_fight_outcome: Mutex<Option<FightOutcome>>,
}

impl MockGameClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(self, snapshot: CharacterSnapshot) -> Self {
        self.characters.lock().unwrap().insert(snapshot.name.clone(), snapshot);
        self
    }

    pub fn with_tile(self, tile: MapTile) -> Self {
        self.tiles.lock().unwrap().insert((tile.x, tile.y), tile);
        self
    }

    pub fn with_item(self, item: ItemData) -> Self {
        self.items.lock().unwrap().insert(item.code.clone(), item);
        self
    }

    pub fn with_monster(self, monster: MonsterData) -> Self {
        self.monsters.lock().unwrap().insert(monster.code.clone(), monster);
        self
    }

    pub fn with_resource(self, resource: ResourceData) -> Self {
        self.resources.lock().unwrap().insert(resource.code.clone(), resource);
        self
    }

    pub fn queue_fight_outcome(&self, outcome: FightOutcome) {
        *self.next_fight_outcome.lock().unwrap() = Some(outcome);
    }

    fn character(&self, name: &str) -> Result<CharacterSnapshot, GameError> {
        self.characters
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| GameError::NotFound(format!("character {name}")))
    }

    fn mutate_character(
        &self,
        name: &str,
        f: impl FnOnce(&mut CharacterSnapshot),
    ) -> Result<CharacterSnapshot, GameError> {
        let mut guard = self.characters.lock().unwrap();
        let snapshot = guard.get_mut(name).ok_or_else(|| GameError::NotFound(format!("character {name}")))?;
        f(snapshot);
        Ok(snapshot.clone())
    }
}

#[async_trait]
impl GameClient for MockGameClient {
    async fn get_character(&self, name: &str) -> Result<CharacterSnapshot, GameError> {
        self.character(name)
    }

    async fn get_characters(&self) -> Result<Vec<CharacterSnapshot>, GameError> {
        Ok(self.characters.lock().unwrap().values().cloned().collect())
    }

    async fn get_map(&self, x: i32, y: i32) -> Result<MapTile, GameError> {
        self.tiles
            .lock()
            .unwrap()
            .get(&(x, y))
            .cloned()
            .ok_or_else(|| GameError::NotFound(format!("tile {x},{y}")))
    }

    async fn get_item(&self, code: &str) -> Result<ItemData, GameError> {
        self.items.lock().unwrap().get(code).cloned().ok_or_else(|| GameError::NotFound(format!("item {code}")))
    }

    async fn get_monster(&self, code: &str) -> Result<MonsterData, GameError> {
        self.monsters
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| GameError::NotFound(format!("monster {code}")))
    }

    async fn get_resource(&self, code: &str) -> Result<ResourceData, GameError> {
        self.resources
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| GameError::NotFound(format!("resource {code}")))
    }

    async fn move_to(&self, character: &str, x: i32, y: i32) -> Result<MoveResult, GameError> {
        let already_at_destination = self.character(character)?.position() == crate::types::Position::new(x, y);
        let snapshot = self.mutate_character(character, |c| {
            c.x = x;
            c.y = y;
        })?;
        Ok(MoveResult { character: snapshot, cooldown_seconds: if already_at_destination { 0.0 } else { 5.0 }, already_at_destination })
    }

    async fn attack(&self, character: &str) -> Result<FightResult, GameError> {
        let outcome = self.next_fight_outcome.lock().unwrap().take().unwrap_or(FightOutcome::Win);
        let hp_lost = match outcome {
            FightOutcome::Win => 5,
            FightOutcome::Loss => 0,
        };
        let snapshot = self.mutate_character(character, |c| {
            c.hp = (c.hp - hp_lost).max(0);
        })?;
        Ok(FightResult { character: snapshot, cooldown_seconds: 8.0, outcome, hp_lost, drops: Vec::new() })
    }

    async fn gather(&self, character: &str) -> Result<GatherResult, GameError> {
        let snapshot = self.character(character)?;
        let code = self
            .tiles
            .lock()
            .unwrap()
            .get(&(snapshot.x, snapshot.y))
            .and_then(|tile| tile.content.as_ref())
            .map(|content| content.code.clone())
            .unwrap_or_else(|| "raw_material".into());
        let updated = self.mutate_character(character, |c| {
            if let Some(slot) = c.inventory.iter_mut().find(|s| s.item_code == code) {
                slot.quantity += 1;
            } else {
                c.inventory.push(InventorySlot { item_code: code.clone(), quantity: 1 });
            }
        })?;
        Ok(GatherResult { character: updated, cooldown_seconds: 10.0, items: vec![InventorySlot { item_code: code, quantity: 1 }] })
    }

    async fn craft(&self, character: &str, item_code: &str, quantity: u32) -> Result<CraftResult, GameError> {
        let snapshot = self.mutate_character(character, |c| {
            c.inventory.push(InventorySlot { item_code: item_code.to_string(), quantity });
        })?;
        Ok(CraftResult {
            character: snapshot,
            cooldown_seconds: 12.0,
            items_produced: vec![InventorySlot { item_code: item_code.to_string(), quantity }],
            items_consumed: Vec::new(),
        })
    }

    async fn equip(&self, character: &str, item_code: &str, slot: &str) -> Result<EquipResult, GameError> {
        let snapshot = self.mutate_character(character, |c| {
            if slot == "weapon" {
                c.equipment.weapon = Some(item_code.to_string());
            }
        })?;
        Ok(EquipResult { character: snapshot, cooldown_seconds: 2.0 })
    }

    async fn unequip(&self, character: &str, slot: &str) -> Result<EquipResult, GameError> {
        let snapshot = self.mutate_character(character, |c| {
            if slot == "weapon" {
                c.equipment.weapon = None;
            }
        })?;
        Ok(EquipResult { character: snapshot, cooldown_seconds: 2.0 })
    }

    async fn rest(&self, character: &str) -> Result<RestResult, GameError> {
        let snapshot = self.mutate_character(character, |c| {
            c.hp = c.max_hp;
        })?;
        Ok(RestResult { character: snapshot, cooldown_seconds: 3.0, hp_restored: 0 })
    }

    fn supports_item_search(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkillLevels;

    fn character(name: &str) -> CharacterSnapshot {
        CharacterSnapshot {
            name: name.to_string(),
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

    #[tokio::test]
    async fn move_to_same_tile_reports_already_at_destination() {
        let client = MockGameClient::new().with_character(character("alice"));
        let result = client.move_to("alice", 0, 0).await.unwrap();
        assert!(result.already_at_destination);
        assert_eq!(result.cooldown_seconds, 0.0);
    }

    #[tokio::test]
    async fn unknown_character_is_not_found() {
        let client = MockGameClient::new();
        assert!(matches!(client.get_character("ghost").await, Err(GameError::NotFound(_))));
    }

    #[tokio::test]
    async fn queued_fight_outcome_is_consumed_once() {
        let client = MockGameClient::new().with_character(character("bob"));
        client.queue_fight_outcome(FightOutcome::Loss);
        let first = client.attack("bob").await.unwrap();
        assert_eq!(first.outcome, FightOutcome::Loss);
        let second = client.attack("bob").await.unwrap();
        assert_eq!(second.outcome, FightOutcome::Win);
    }
}
