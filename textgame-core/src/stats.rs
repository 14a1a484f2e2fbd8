//! Derived stat computation.

use crate::models::{Character, EquipBonus, Stats};

/// Sum of bonuses over every equipped weapon and armor entry.
pub fn equipped_bonus(character: &Character) -> EquipBonus {
    character
        .equipped()
        .filter_map(|entry| entry.item.kind.equip_bonus())
        .fold(EquipBonus::default(), |acc, bonus| EquipBonus {
            attack: acc.attack.saturating_add(bonus.attack),
            defense: acc.defense.saturating_add(bonus.defense),
            health: acc.health.saturating_add(bonus.health),
            mana: acc.mana.saturating_add(bonus.mana),
        })
}

/// Final stats for `base` under `bonus`. Dexterity and luck have no item
/// bonuses.
pub fn final_stats(base: &Stats, bonus: &EquipBonus) -> Stats {
    Stats {
        max_hp: base.max_hp.saturating_add(bonus.health),
        max_mp: base.max_mp.saturating_add(bonus.mana),
        atk: base.atk.saturating_add(bonus.attack),
        def: base.def.saturating_add(bonus.defense),
        dex: base.dex,
        luk: base.luk,
    }
}

/// Recompute a character's final stats from base stats and equipment, then
/// clamp current HP/MP to the new maximums.
pub fn recompute_final_stats(character: &mut Character) {
    let bonus = equipped_bonus(character);
    character.stats = final_stats(&character.base, &bonus);
    character.current_hp = character.current_hp.min(character.stats.max_hp);
    character.current_mp = character.current_mp.min(character.stats.max_mp);

    tracing::debug!(
        "Recomputed stats for character {}: atk={} def={} hp={}/{} mp={}/{}",
        character.id,
        character.stats.atk,
        character.stats.def,
        character.current_hp,
        character.stats.max_hp,
        character.current_mp,
        character.stats.max_mp
    );
}
