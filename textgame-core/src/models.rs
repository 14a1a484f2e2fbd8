//! Data models for the dungeon game: characters, item and monster templates,
//! inventory entries and skills.

use crate::error::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type CharacterId = i64;
pub type ItemId = i64;
pub type MonsterId = i64;
pub type SkillId = i64;
/// Per-character inventory slot number, never reused within a character.
pub type EntryId = u32;

/// Combat attributes. Used both for a character's base stats and for the
/// derived stats that include equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub max_hp: u32,
    pub max_mp: u32,
    pub atk: u32,
    pub def: u32,
    pub dex: u32,
    pub luk: u32,
}

/// Item category tag as stored in the `items.type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    Weapon,
    Armor,
    Potion,
    Consumable,
    Key,
    Etc,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Weapon => "WEAPON",
            ItemType::Armor => "ARMOR",
            ItemType::Potion => "POTION",
            ItemType::Consumable => "CONSUMABLE",
            ItemType::Key => "KEY",
            ItemType::Etc => "ETC",
        }
    }

    pub fn is_equipment(&self) -> bool {
        matches!(self, ItemType::Weapon | ItemType::Armor)
    }

    pub fn is_usable(&self) -> bool {
        matches!(self, ItemType::Potion | ItemType::Consumable)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "WEAPON" => Ok(ItemType::Weapon),
            "ARMOR" => Ok(ItemType::Armor),
            "POTION" => Ok(ItemType::Potion),
            "CONSUMABLE" => Ok(ItemType::Consumable),
            "KEY" => Ok(ItemType::Key),
            "ETC" => Ok(ItemType::Etc),
            other => Err(GameError::Corrupt(format!("Unknown item type: {}", other))),
        }
    }
}

/// Bonuses an equipped weapon or armor adds to the wearer's stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EquipBonus {
    pub attack: u32,
    pub defense: u32,
    pub health: u32,
    pub mana: u32,
}

/// What a potion or consumable restores when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Restore {
    pub heal: u32,
    pub mana: u32,
}

/// Item behavior, selected by the type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Weapon(EquipBonus),
    Armor(EquipBonus),
    Potion(Restore),
    Consumable(Restore),
    Key,
    Etc,
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Weapon(_) => ItemType::Weapon,
            ItemKind::Armor(_) => ItemType::Armor,
            ItemKind::Potion(_) => ItemType::Potion,
            ItemKind::Consumable(_) => ItemType::Consumable,
            ItemKind::Key => ItemType::Key,
            ItemKind::Etc => ItemType::Etc,
        }
    }

    pub fn equip_bonus(&self) -> Option<&EquipBonus> {
        match self {
            ItemKind::Weapon(bonus) | ItemKind::Armor(bonus) => Some(bonus),
            _ => None,
        }
    }

    pub fn restore(&self) -> Option<&Restore> {
        match self {
            ItemKind::Potion(restore) | ItemKind::Consumable(restore) => Some(restore),
            _ => None,
        }
    }

    /// Build from the flat column layout of the `items` table. Columns that
    /// do not apply to the type are ignored.
    pub fn from_columns(item_type: ItemType, bonus: EquipBonus, restore: Restore) -> Self {
        match item_type {
            ItemType::Weapon => ItemKind::Weapon(bonus),
            ItemType::Armor => ItemKind::Armor(bonus),
            ItemType::Potion => ItemKind::Potion(restore),
            ItemType::Consumable => ItemKind::Consumable(restore),
            ItemType::Key => ItemKind::Key,
            ItemType::Etc => ItemKind::Etc,
        }
    }
}

/// Item template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Buy price. Selling pays a configured share of it.
    pub price: u64,
    pub kind: ItemKind,
}

impl Item {
    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }
}

/// One inventory slot tying a character to an item stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    pub id: EntryId,
    pub item: Item,
    pub quantity: u32,
    pub equipped: bool,
}

/// Skill template. Characters can own skills; casting them is not part of
/// battle resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub damage: u32,
    pub mana_cost: u32,
    pub cooldown: u32,
    pub is_healing: bool,
    pub heal_amount: u32,
}

/// Monster template shared by every encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub id: MonsterId,
    pub name: String,
    pub floor: u32,
    pub is_boss: bool,
    pub reward_exp: u64,
    pub reward_gold: u64,
    pub stats: Stats,
    pub icon: String,
}

impl Monster {
    /// A fresh battle instance at full health.
    pub fn instantiate(&self) -> MonsterInstance {
        MonsterInstance {
            template_id: self.id,
            current_hp: self.stats.max_hp,
        }
    }
}

/// The mutable part of a monster during one encounter. The caller carries it
/// from turn to turn; the template is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterInstance {
    pub template_id: MonsterId,
    pub current_hp: u32,
}

/// Monster template plus the HP of the current encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonsterSnapshot {
    #[serde(flatten)]
    pub template: Monster,
    pub current_hp: u32,
}

impl MonsterSnapshot {
    pub fn new(template: Monster, instance: &MonsterInstance) -> Self {
        Self {
            template,
            current_hp: instance.current_hp,
        }
    }

    pub fn instance(&self) -> MonsterInstance {
        MonsterInstance {
            template_id: self.template.id,
            current_hp: self.current_hp,
        }
    }
}

/// A player's persistent game entity.
///
/// `stats` is derived from `base` and the equipped inventory and is only
/// written by [`crate::stats::recompute_final_stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Character {
    pub id: CharacterId,
    pub login_id: String,
    pub name: String,
    pub level: u32,
    pub experience: u64,
    pub gold: u64,
    pub floor: u32,
    /// Victories on the current floor since arriving or since its boss fell.
    pub floor_kills: u32,
    /// Highest floor whose boss has been defeated, 0 if none.
    pub cleared_floor: u32,
    pub stat_points: u32,
    pub current_hp: u32,
    pub current_mp: u32,
    pub base: Stats,
    pub(crate) stats: Stats,
    pub skills: Vec<Skill>,
    pub inventory: Vec<InventoryEntry>,
    pub(crate) next_entry_id: EntryId,
}

impl Character {
    /// A level 1 character on floor 1 at full health with the given base stats.
    pub fn new(
        id: CharacterId,
        login_id: impl Into<String>,
        name: impl Into<String>,
        base: Stats,
        gold: u64,
        stat_points: u32,
    ) -> Self {
        Self {
            id,
            login_id: login_id.into(),
            name: name.into(),
            level: 1,
            experience: 0,
            gold,
            floor: 1,
            floor_kills: 0,
            cleared_floor: 0,
            stat_points,
            current_hp: base.max_hp,
            current_mp: base.max_mp,
            base,
            stats: base,
            skills: Vec::new(),
            inventory: Vec::new(),
            next_entry_id: 1,
        }
    }

    /// Final stats: base plus equipped item bonuses.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn next_entry_id(&self) -> EntryId {
        self.next_entry_id
    }

    pub fn entry(&self, entry_id: EntryId) -> Option<&InventoryEntry> {
        self.inventory.iter().find(|e| e.id == entry_id)
    }

    pub fn entry_for_item(&self, item_id: ItemId) -> Option<&InventoryEntry> {
        self.inventory.iter().find(|e| e.item.id == item_id)
    }

    pub(crate) fn entry_index(&self, entry_id: EntryId) -> Result<usize> {
        self.inventory
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or_else(|| {
                GameError::NotFound(format!(
                    "Inventory entry {} for character {}",
                    entry_id, self.id
                ))
            })
    }

    pub(crate) fn allocate_entry_id(&mut self) -> EntryId {
        let id = self.next_entry_id;
        self.next_entry_id += 1;
        id
    }

    pub fn equipped(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.inventory.iter().filter(|e| e.equipped)
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }

    pub fn knows_skill(&self, skill_id: SkillId) -> bool {
        self.skills.iter().any(|s| s.id == skill_id)
    }
}
