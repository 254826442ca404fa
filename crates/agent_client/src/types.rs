//! Entity DTOs as returned by the game server. These are deliberately
//! "raw" — no learned fields (combat history, discovered locations,
//! win rate) live here; `agent_world` wraps them with that accumulated
//! knowledge.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// max(|dx|, |dy|) — the ring distance used by the map search.
    pub fn chebyshev_distance(&self, other: &Position) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillLevels {
    pub mining: u32,
    pub woodcutting: u32,
    pub fishing: u32,
    pub weaponcrafting: u32,
    pub gearcrafting: u32,
    pub jewelrycrafting: u32,
    pub cooking: u32,
    pub alchemy: u32,
}

impl SkillLevels {
    pub fn get(&self, skill: &str) -> Option<u32> {
        Some(match skill {
            "mining" => self.mining,
            "woodcutting" => self.woodcutting,
            "fishing" => self.fishing,
            "weaponcrafting" => self.weaponcrafting,
            "gearcrafting" => self.gearcrafting,
            "jewelrycrafting" => self.jewelrycrafting,
            "cooking" => self.cooking,
            "alchemy" => self.alchemy,
            _ => return None,
        })
    }
}

/// Explicit enumeration of equipment slots (Design Notes §9: avoid
/// reflecting over `*_slot`-suffixed attributes; enumerate the table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Weapon,
    Shield,
    Helmet,
    BodyArmor,
    LegArmor,
    Boots,
    Ring1,
    Ring2,
    Amulet,
    Artifact1,
    Artifact2,
    Artifact3,
    Utility1,
    Utility2,
    Bag,
    Rune,
}

impl EquipmentSlot {
    /// All slots, in a stable order, with the semantic category each
    /// belongs to.
    pub const ALL: [EquipmentSlot; 16] = [
        EquipmentSlot::Weapon,
        EquipmentSlot::Shield,
        EquipmentSlot::Helmet,
        EquipmentSlot::BodyArmor,
        EquipmentSlot::LegArmor,
        EquipmentSlot::Boots,
        EquipmentSlot::Ring1,
        EquipmentSlot::Ring2,
        EquipmentSlot::Amulet,
        EquipmentSlot::Artifact1,
        EquipmentSlot::Artifact2,
        EquipmentSlot::Artifact3,
        EquipmentSlot::Utility1,
        EquipmentSlot::Utility2,
        EquipmentSlot::Bag,
        EquipmentSlot::Rune,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentSlot::Weapon => "weapon",
            EquipmentSlot::Shield => "shield",
            EquipmentSlot::Helmet => "helmet",
            EquipmentSlot::BodyArmor => "body_armor",
            EquipmentSlot::LegArmor => "leg_armor",
            EquipmentSlot::Boots => "boots",
            EquipmentSlot::Ring1 => "ring1",
            EquipmentSlot::Ring2 => "ring2",
            EquipmentSlot::Amulet => "amulet",
            EquipmentSlot::Artifact1 => "artifact1",
            EquipmentSlot::Artifact2 => "artifact2",
            EquipmentSlot::Artifact3 => "artifact3",
            EquipmentSlot::Utility1 => "utility1",
            EquipmentSlot::Utility2 => "utility2",
            EquipmentSlot::Bag => "bag",
            EquipmentSlot::Rune => "rune",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<String>,
    pub shield: Option<String>,
    pub helmet: Option<String>,
    pub body_armor: Option<String>,
    pub leg_armor: Option<String>,
    pub boots: Option<String>,
    pub ring1: Option<String>,
    pub ring2: Option<String>,
    pub amulet: Option<String>,
    pub artifact1: Option<String>,
    pub artifact2: Option<String>,
    pub artifact3: Option<String>,
    pub utility1: Option<String>,
    pub utility2: Option<String>,
    pub bag: Option<String>,
    pub rune: Option<String>,
}

impl Equipment {
    pub fn get(&self, slot: EquipmentSlot) -> Option<&str> {
        match slot {
            EquipmentSlot::Weapon => self.weapon.as_deref(),
            EquipmentSlot::Shield => self.shield.as_deref(),
            EquipmentSlot::Helmet => self.helmet.as_deref(),
            EquipmentSlot::BodyArmor => self.body_armor.as_deref(),
            EquipmentSlot::LegArmor => self.leg_armor.as_deref(),
            EquipmentSlot::Boots => self.boots.as_deref(),
            EquipmentSlot::Ring1 => self.ring1.as_deref(),
            EquipmentSlot::Ring2 => self.ring2.as_deref(),
            EquipmentSlot::Amulet => self.amulet.as_deref(),
            EquipmentSlot::Artifact1 => self.artifact1.as_deref(),
            EquipmentSlot::Artifact2 => self.artifact2.as_deref(),
            EquipmentSlot::Artifact3 => self.artifact3.as_deref(),
            EquipmentSlot::Utility1 => self.utility1.as_deref(),
            EquipmentSlot::Utility2 => self.utility2.as_deref(),
            EquipmentSlot::Bag => self.bag.as_deref(),
            EquipmentSlot::Rune => self.rune.as_deref(),
        }
    }

    /// Every occupied slot, in `EquipmentSlot::ALL` order.
    pub fn occupied(&self) -> Vec<(EquipmentSlot, &str)> {
        EquipmentSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|code| (slot, code)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub item_code: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub level: u32,
    pub skills: SkillLevels,
    pub gold: u64,
    pub inventory: Vec<InventorySlot>,
    pub equipment: Equipment,
    /// Seconds until the next action is permitted, as reported by the
    /// server on the snapshot itself (distinct from the cooldown implied
    /// by the most recent action's response).
    pub cooldown_seconds: f64,
}

impl CharacterSnapshot {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn inventory_quantity(&self, item_code: &str) -> u32 {
        self.inventory
            .iter()
            .find(|slot| slot.item_code == item_code)
            .map(|slot| slot.quantity)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileContentType {
    Monster,
    Resource,
    Workshop,
    Bank,
    GrandExchange,
    TasksMaster,
    Npc,
    Town,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileContent {
    pub content_type: TileContentType,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapTile {
    pub x: i32,
    pub y: i32,
    pub content: Option<TileContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropRate {
    pub code: String,
    pub rate: u32,
    pub min_quantity: u32,
    pub max_quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementalStats {
    pub fire: i32,
    pub earth: i32,
    pub water: i32,
    pub air: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterData {
    pub code: String,
    pub level: u32,
    pub hp: i32,
    pub attack: ElementalStats,
    pub resistance: ElementalStats,
    pub drops: Vec<DropRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    pub code: String,
    pub skill: String,
    pub level: u32,
    pub drops: Vec<DropRate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Helmet,
    BodyArmor,
    LegArmor,
    Boots,
    Ring,
    Amulet,
    Artifact,
    Utility,
    Resource,
    Consumable,
    Currency,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub code: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftData {
    pub skill: String,
    pub level: u32,
    pub items: Vec<MaterialRequirement>,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub code: String,
    pub name: String,
    pub item_type: ItemType,
    pub level: u32,
    pub effects: Vec<String>,
    pub craft: Option<CraftData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopData {
    pub code: String,
    pub skill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveResult {
    pub character: CharacterSnapshot,
    pub cooldown_seconds: f64,
    pub already_at_destination: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FightOutcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightResult {
    pub character: CharacterSnapshot,
    pub cooldown_seconds: f64,
    pub outcome: FightOutcome,
    pub hp_lost: i32,
    pub drops: Vec<InventorySlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherResult {
    pub character: CharacterSnapshot,
    pub cooldown_seconds: f64,
    pub items: Vec<InventorySlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftResult {
    pub character: CharacterSnapshot,
    pub cooldown_seconds: f64,
    pub items_produced: Vec<InventorySlot>,
    pub items_consumed: Vec<InventorySlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipResult {
    pub character: CharacterSnapshot,
    pub cooldown_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestResult {
    pub character: CharacterSnapshot,
    pub cooldown_seconds: f64,
    pub hp_restored: i32,
}
