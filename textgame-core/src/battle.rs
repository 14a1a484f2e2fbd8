//! Turn resolution between a character and a monster instance.
//!
//! A turn is the character's basic attack followed, if the monster survives,
//! by the monster's counter-attack. There is no battle session: the caller
//! passes the monster's current HP in and gets the new value back.

use crate::config::{BattleConfig, EngineConfig};
use crate::economy;
use crate::error::{GameError, Result};
use crate::models::{Character, Monster, MonsterInstance};
use crate::progression;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattleState {
    Ongoing,
    PlayerVictory,
    PlayerDefeat,
}

/// Something that happened during a turn, in order, for client display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattleEvent {
    PlayerAttack { damage: u32, critical: bool },
    MonsterAttack { damage: u32 },
    Reward { exp: u64, gold: u64 },
    LevelUp { level: u32 },
    BossDefeated { floor: u32 },
    Defeat,
}

impl BattleEvent {
    pub fn describe(&self, monster_name: &str) -> String {
        match self {
            BattleEvent::PlayerAttack { damage, critical: true } => {
                format!("You attack {} for {} damage (Critical!)", monster_name, damage)
            }
            BattleEvent::PlayerAttack { damage, critical: false } => {
                format!("You attack {} for {} damage", monster_name, damage)
            }
            BattleEvent::MonsterAttack { damage } => {
                format!("{} attacks you for {} damage", monster_name, damage)
            }
            BattleEvent::Reward { exp, gold } => {
                format!("You defeated {}! You gained {} EXP and {} gold", monster_name, exp, gold)
            }
            BattleEvent::LevelUp { level } => format!("Level up! You are now level {}", level),
            BattleEvent::BossDefeated { floor } => {
                format!("The guardian of floor {} has fallen. The way down is open", floor)
            }
            BattleEvent::Defeat => "You have been defeated".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    pub monster: MonsterInstance,
    pub events: Vec<BattleEvent>,
    pub state: BattleState,
}

impl TurnOutcome {
    pub fn battle_over(&self) -> bool {
        self.state != BattleState::Ongoing
    }

    pub fn player_won(&self) -> bool {
        self.state == BattleState::PlayerVictory
    }
}

/// Roll for a critical hit: a uniform roll in `0..100` below `luk` hits.
pub fn roll_critical<R: Rng>(luk: u32, config: &BattleConfig, rng: &mut R) -> bool {
    config.critical_hits && rng.gen_range(0..100u32) < luk
}

/// Damage of a basic attack. Defense can reduce it to zero but not below.
pub fn attack_damage(atk: u32, def: u32, critical: bool, config: &BattleConfig) -> u32 {
    let damage = atk.saturating_sub(def);
    if critical {
        damage.saturating_mul(config.critical_multiplier)
    } else {
        damage
    }
}

fn validate_turn(character: &Character, monster: &Monster, instance: &MonsterInstance) -> Result<()> {
    if instance.template_id != monster.id {
        return Err(GameError::InvalidOperation(format!(
            "Monster instance belongs to template {}, not {}",
            instance.template_id, monster.id
        )));
    }
    if instance.current_hp == 0 {
        return Err(GameError::InvalidOperation(format!(
            "{} is already defeated",
            monster.name
        )));
    }
    if instance.current_hp > monster.stats.max_hp {
        return Err(GameError::InvalidOperation(format!(
            "{} cannot have {} HP (max {})",
            monster.name, instance.current_hp, monster.stats.max_hp
        )));
    }
    if character.is_defeated() {
        return Err(GameError::InvalidOperation(format!(
            "{} has no HP left to fight",
            character.name
        )));
    }
    Ok(())
}

/// Resolve one turn of `character` attacking `instance` of `monster`.
pub fn resolve_attack<R: Rng>(
    character: &mut Character,
    monster: &Monster,
    instance: &MonsterInstance,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<TurnOutcome> {
    validate_turn(character, monster, instance)?;

    let mut events = Vec::new();
    let critical = roll_critical(character.stats().luk, &config.battle, rng);
    let damage = attack_damage(character.stats().atk, monster.stats.def, critical, &config.battle);
    let monster_hp = instance.current_hp.saturating_sub(damage);
    events.push(BattleEvent::PlayerAttack { damage, critical });

    tracing::debug!(
        "Character {} hits {} for {} (critical: {}), {} HP left",
        character.id,
        monster.name,
        damage,
        critical,
        monster_hp
    );

    let monster_after = MonsterInstance {
        template_id: monster.id,
        current_hp: monster_hp,
    };

    if monster_hp == 0 {
        grant_victory(character, monster, config, &mut events);
        return Ok(TurnOutcome {
            monster: monster_after,
            events,
            state: BattleState::PlayerVictory,
        });
    }

    let counter = monster.stats.atk;
    character.current_hp = character.current_hp.saturating_sub(counter);
    events.push(BattleEvent::MonsterAttack { damage: counter });

    let state = if character.current_hp == 0 {
        events.push(BattleEvent::Defeat);
        BattleState::PlayerDefeat
    } else {
        BattleState::Ongoing
    };

    Ok(TurnOutcome {
        monster: monster_after,
        events,
        state,
    })
}

fn grant_victory(
    character: &mut Character,
    monster: &Monster,
    config: &EngineConfig,
    events: &mut Vec<BattleEvent>,
) {
    events.push(BattleEvent::Reward {
        exp: monster.reward_exp,
        gold: monster.reward_gold,
    });
    economy::credit(character, monster.reward_gold);
    for level in progression::award_experience(character, monster.reward_exp, &config.progression) {
        events.push(BattleEvent::LevelUp { level });
    }

    if monster.floor == character.floor {
        if monster.is_boss {
            character.floor_kills = 0;
            character.cleared_floor = character.cleared_floor.max(monster.floor);
            events.push(BattleEvent::BossDefeated { floor: monster.floor });
        } else {
            character.floor_kills = character.floor_kills.saturating_add(1);
        }
    }
}
