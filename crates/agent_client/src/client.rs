//! The `GameClient` capability trait. Everything above `agent_client`
//! programs against `dyn GameClient`, never against `reqwest` or the HTTP
//! implementation directly — `agent_world` fetches on cache miss, and
//! `agent_actions` calls the mutating operations, both through this trait.

use crate::error::GameError;
use crate::types::{
    CharacterSnapshot, CraftResult, EquipResult, FightResult, GatherResult, ItemData, MapTile,
    MonsterData, MoveResult, ResourceData, RestResult,
};
use async_trait::async_trait;

/// Abstraction over the game server's REST surface. One method per
/// operation in the operation table; mutating operations take the
/// character name since a single client may drive several characters.
#[async_trait]
pub trait GameClient: Send + Sync {
    async fn get_character(&self, name: &str) -> Result<CharacterSnapshot, GameError>;

    async fn get_characters(&self) -> Result<Vec<CharacterSnapshot>, GameError>;

    async fn get_map(&self, x: i32, y: i32) -> Result<MapTile, GameError>;

    async fn get_item(&self, code: &str) -> Result<ItemData, GameError>;

    async fn get_monster(&self, code: &str) -> Result<MonsterData, GameError>;

    async fn get_resource(&self, code: &str) -> Result<ResourceData, GameError>;

    async fn move_to(&self, character: &str, x: i32, y: i32) -> Result<MoveResult, GameError>;

    async fn attack(&self, character: &str) -> Result<FightResult, GameError>;

    async fn gather(&self, character: &str) -> Result<GatherResult, GameError>;

    async fn craft(&self, character: &str, item_code: &str, quantity: u32) -> Result<CraftResult, GameError>;

    async fn equip(&self, character: &str, item_code: &str, slot: &str) -> Result<EquipResult, GameError>;

    async fn unequip(&self, character: &str, slot: &str) -> Result<EquipResult, GameError>;

    async fn rest(&self, character: &str) -> Result<RestResult, GameError>;

    /// Capability probe for `LookupItemInfoAction` (Open Question 3):
    /// whether this client exposes an item-search endpoint beyond
    /// lookup-by-code. The HTTP client reports `true`; the mock defaults
    /// to `false` so tests exercise the gated-off path unless they opt in.
    fn supports_item_search(&self) -> bool {
        false
    }
}
