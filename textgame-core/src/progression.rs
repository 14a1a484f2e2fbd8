//! Experience, level-ups, stat point allocation and skill learning.

use crate::config::{ExpOverflow, ProgressionConfig};
use crate::error::{GameError, Result};
use crate::models::{Character, Skill};
use crate::stats::recompute_final_stats;
use serde::{Deserialize, Serialize};

/// Stat points to move into base stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatAllocation {
    pub atk: u32,
    pub def: u32,
    pub dex: u32,
    pub luk: u32,
}

impl StatAllocation {
    pub fn total(&self) -> Option<u32> {
        self.atk
            .checked_add(self.def)?
            .checked_add(self.dex)?
            .checked_add(self.luk)
    }
}

/// Add experience and apply every level-up it pays for. Returns the levels
/// reached, in order; empty if none.
///
/// Each level-up grants stat points and base max HP and fully heals HP.
/// Leftover experience is reset to zero or carried over depending on
/// `config.overflow`. Nothing happens past `config.max_level` except that
/// experience keeps accumulating.
pub fn award_experience(character: &mut Character, amount: u64, config: &ProgressionConfig) -> Vec<u32> {
    character.experience = character.experience.saturating_add(amount);

    let mut reached = Vec::new();
    while character.level < config.max_level {
        let required = config.required_exp(character.level);
        if character.experience < required {
            break;
        }
        character.experience = match config.overflow {
            ExpOverflow::Reset => 0,
            ExpOverflow::Carry => character.experience - required,
        };
        character.level += 1;
        character.stat_points = character.stat_points.saturating_add(config.stat_points_per_level);
        character.base.max_hp = character.base.max_hp.saturating_add(config.hp_per_level);
        recompute_final_stats(character);
        character.current_hp = character.stats().max_hp;
        reached.push(character.level);

        tracing::debug!("Character {} reached level {}", character.id, character.level);
    }
    reached
}

/// Spend unassigned stat points on base stats.
pub fn allocate_stat_points(character: &mut Character, allocation: &StatAllocation) -> Result<()> {
    let total = allocation.total().ok_or_else(|| {
        GameError::InvalidOperation("Stat allocation total overflows".to_string())
    })?;
    if character.stat_points < total {
        return Err(GameError::InsufficientResource {
            requested: total,
            available: character.stat_points,
        });
    }

    let base = &mut character.base;
    base.atk = base.atk.saturating_add(allocation.atk);
    base.def = base.def.saturating_add(allocation.def);
    base.dex = base.dex.saturating_add(allocation.dex);
    base.luk = base.luk.saturating_add(allocation.luk);
    character.stat_points -= total;
    recompute_final_stats(character);
    Ok(())
}

/// Add `skill` to the character's owned skills. Returns false if it was
/// already known.
pub fn learn_skill(character: &mut Character, skill: &Skill) -> bool {
    if character.knows_skill(skill.id) {
        return false;
    }
    character.skills.push(skill.clone());
    true
}
