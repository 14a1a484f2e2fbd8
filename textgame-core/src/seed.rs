//! Built-in starter content: three floors of monsters, a small shop and a
//! handful of skills. Ids are assigned by the database on insert.

use crate::models::{EquipBonus, Item, ItemKind, Monster, Restore, Skill, Stats};

#[allow(clippy::too_many_arguments)]
fn monster(
    floor: u32,
    name: &str,
    icon: &str,
    is_boss: bool,
    reward_exp: u64,
    reward_gold: u64,
    max_hp: u32,
    max_mp: u32,
    atk: u32,
    def: u32,
    dex: u32,
    luk: u32,
) -> Monster {
    Monster {
        id: 0,
        name: name.into(),
        floor,
        is_boss,
        reward_exp,
        reward_gold,
        stats: Stats { max_hp, max_mp, atk, def, dex, luk },
        icon: icon.into(),
    }
}

pub fn default_monsters() -> Vec<Monster> {
    vec![
        monster(1, "Goblin", "🐢", false, 10, 50, 100, 0, 10, 10, 10, 10),
        monster(1, "Slime", "🟢", false, 8, 40, 80, 0, 8, 5, 8, 5),
        monster(1, "Goblin King", "👑", true, 50, 200, 300, 30, 25, 15, 15, 10),
        monster(2, "Kobold", "🐺", false, 30, 100, 150, 0, 15, 10, 10, 10),
        monster(2, "Wolf", "🐺", false, 25, 80, 120, 0, 18, 8, 18, 12),
        monster(2, "Wolf King", "🐺👑", true, 80, 400, 400, 50, 35, 20, 25, 15),
        monster(3, "Orc", "🗡️", false, 70, 200, 300, 50, 30, 50, 0, 0),
        monster(3, "Troll", "👹", false, 60, 180, 280, 40, 28, 45, 5, 5),
        monster(3, "Orc King", "🗡️👑", true, 150, 800, 600, 100, 50, 60, 10, 5),
    ]
}

fn item(name: &str, description: &str, icon: &str, price: u64, kind: ItemKind) -> Item {
    Item {
        id: 0,
        name: name.into(),
        description: description.into(),
        icon: icon.into(),
        price,
        kind,
    }
}

pub fn default_items() -> Vec<Item> {
    vec![
        item(
            "Wooden Sword",
            "A practice blade.",
            "🗡️",
            100,
            ItemKind::Weapon(EquipBonus { attack: 5, ..EquipBonus::default() }),
        ),
        item(
            "Iron Sword",
            "Standard issue for dungeon delvers.",
            "⚔️",
            300,
            ItemKind::Weapon(EquipBonus { attack: 12, ..EquipBonus::default() }),
        ),
        item(
            "Leather Armor",
            "Light and cheap.",
            "🥋",
            100,
            ItemKind::Armor(EquipBonus { defense: 5, health: 10, ..EquipBonus::default() }),
        ),
        item(
            "Chain Mail",
            "Heavy rings of steel.",
            "🛡️",
            350,
            ItemKind::Armor(EquipBonus { defense: 12, health: 30, ..EquipBonus::default() }),
        ),
        item(
            "Health Potion",
            "Restores 50 HP.",
            "🧪",
            20,
            ItemKind::Potion(Restore { heal: 50, mana: 0 }),
        ),
        item(
            "Mana Potion",
            "Restores 30 MP.",
            "💧",
            25,
            ItemKind::Potion(Restore { heal: 0, mana: 30 }),
        ),
        item(
            "Trail Ration",
            "Dry bread and jerky. Restores 15 HP and 10 MP.",
            "🍖",
            10,
            ItemKind::Consumable(Restore { heal: 15, mana: 10 }),
        ),
        item("Rusty Key", "Opens something, somewhere.", "🔑", 5, ItemKind::Key),
        item(
            "Dragon Slayer",
            "A legendary greatsword.",
            "🐉",
            3000,
            ItemKind::Weapon(EquipBonus { attack: 40, health: 20, ..EquipBonus::default() }),
        ),
        item(
            "Phoenix Armor",
            "Warm to the touch.",
            "🔥",
            3000,
            ItemKind::Armor(EquipBonus { defense: 35, health: 80, mana: 20, ..EquipBonus::default() }),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn skill(
    name: &str,
    description: &str,
    icon: &str,
    damage: u32,
    mana_cost: u32,
    cooldown: u32,
    is_healing: bool,
    heal_amount: u32,
) -> Skill {
    Skill {
        id: 0,
        name: name.into(),
        description: description.into(),
        icon: icon.into(),
        damage,
        mana_cost,
        cooldown,
        is_healing,
        heal_amount,
    }
}

pub fn default_skills() -> Vec<Skill> {
    vec![
        skill("Power Strike", "A heavy overhead blow.", "💥", 30, 10, 2, false, 0),
        skill("Fireball", "Hurls a ball of fire.", "🔥", 50, 20, 3, false, 0),
        skill("Heal", "Mends wounds.", "✨", 0, 15, 3, true, 60),
        skill("Whirlwind", "Spins with blade extended.", "🌀", 40, 25, 4, false, 0),
    ]
}
