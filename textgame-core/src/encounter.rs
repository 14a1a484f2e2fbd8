//! Picking the next monster on a floor and moving between floors.

use crate::config::BattleConfig;
use crate::error::{GameError, Result};
use crate::models::{Character, Monster};
use rand::Rng;
use rand::seq::SliceRandom;

/// Choose the monster the character meets next on their current floor.
///
/// The floor's boss appears once the character has `boss_kill_threshold`
/// regular victories there; otherwise a random regular monster does.
pub fn spawn_encounter<'a, R: Rng>(
    character: &Character,
    monsters: &'a [Monster],
    config: &BattleConfig,
    rng: &mut R,
) -> Result<&'a Monster> {
    let on_floor = monsters.iter().filter(|m| m.floor == character.floor);
    let boss = on_floor.clone().find(|m| m.is_boss);
    let regulars: Vec<&Monster> = on_floor.filter(|m| !m.is_boss).collect();

    let boss_due = character.floor_kills >= config.boss_kill_threshold;
    let chosen = match boss {
        Some(boss) if boss_due || regulars.is_empty() => Some(boss),
        _ => regulars.choose(rng).copied(),
    };

    chosen.ok_or_else(|| GameError::NotFound(format!("Monsters on floor {}", character.floor)))
}

/// Move down one floor once the current floor's boss has fallen. Returns the
/// new floor.
pub fn advance_floor(character: &mut Character, next_floor_populated: bool) -> Result<u32> {
    if character.cleared_floor < character.floor {
        return Err(GameError::InvalidOperation(format!(
            "The boss of floor {} has not been defeated",
            character.floor
        )));
    }
    if !next_floor_populated {
        return Err(GameError::NotFound(format!("Floor {}", character.floor + 1)));
    }
    character.floor += 1;
    character.floor_kills = 0;
    Ok(character.floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stats;
    use crate::stats::fixtures::character;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn monster(id: i64, floor: u32, is_boss: bool) -> Monster {
        Monster {
            id,
            name: format!("Monster {}", id),
            floor,
            is_boss,
            reward_exp: 10,
            reward_gold: 10,
            stats: Stats { max_hp: 50, max_mp: 0, atk: 5, def: 5, dex: 5, luk: 5 },
            icon: String::new(),
        }
    }

    fn dungeon() -> Vec<Monster> {
        vec![
            monster(1, 1, false),
            monster(2, 1, false),
            monster(3, 1, true),
            monster(4, 2, false),
            monster(5, 2, true),
        ]
    }

    #[test]
    fn test_regular_monster_from_current_floor() {
        let character = character();
        let monsters = dungeon();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let picked = spawn_encounter(&character, &monsters, &BattleConfig::default(), &mut rng).unwrap();
            assert_eq!(picked.floor, 1);
            assert!(!picked.is_boss);
        }
    }

    #[test]
    fn test_boss_after_threshold() {
        let mut character = character();
        character.floor_kills = 5;
        let monsters = dungeon();
        let mut rng = StdRng::seed_from_u64(5);
        let picked = spawn_encounter(&character, &monsters, &BattleConfig::default(), &mut rng).unwrap();
        assert_eq!(picked.id, 3);
    }

    #[test]
    fn test_empty_floor_not_found() {
        let mut character = character();
        character.floor = 9;
        let monsters = dungeon();
        let mut rng = StdRng::seed_from_u64(5);
        let err = spawn_encounter(&character, &monsters, &BattleConfig::default(), &mut rng).unwrap_err();
        assert!(matches!(err, GameError::NotFound(_)));
    }

    #[test]
    fn test_advance_requires_cleared_floor() {
        let mut character = character();
        let err = advance_floor(&mut character, true).unwrap_err();
        assert!(matches!(err, GameError::InvalidOperation(_)));
        assert_eq!(character.floor, 1);

        character.cleared_floor = 1;
        character.floor_kills = 2;
        assert_eq!(advance_floor(&mut character, true).unwrap(), 2);
        assert_eq!(character.floor_kills, 0);
    }

    #[test]
    fn test_advance_past_last_floor_not_found() {
        let mut character = character();
        character.cleared_floor = 1;
        let err = advance_floor(&mut character, false).unwrap_err();
        assert!(matches!(err, GameError::NotFound(_)));
        assert_eq!(character.floor, 1);
    }
}
