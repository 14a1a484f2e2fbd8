//! By-id operations over the game database.
//!
//! Every mutating call loads the character inside an `IMMEDIATE` transaction,
//! runs the engine against it, writes it back and commits. Any error drops
//! the transaction, so a failed call leaves the database untouched.

use crate::battle::{self, BattleEvent};
use crate::config::EngineConfig;
use crate::database::Database;
use crate::encounter;
use crate::error::{GameError, Result};
use crate::inventory;
use crate::models::{
    Character, CharacterId, EntryId, Item, ItemId, Monster, MonsterInstance, MonsterSnapshot, Skill,
    SkillId,
};
use crate::progression::{self, StatAllocation};
use crate::seed;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::path::Path;

/// Result of one attack turn, as handed back to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub character: Character,
    pub monster: MonsterSnapshot,
    pub events: Vec<BattleEvent>,
    pub battle_over: bool,
    pub player_won: bool,
}

impl TurnReport {
    /// Human readable lines for each event of the turn.
    pub fn messages(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|event| event.describe(&self.monster.template.name))
            .collect()
    }
}

/// How many templates `seed_defaults` inserted per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub items: usize,
    pub monsters: usize,
    pub skills: usize,
}

pub struct GameService {
    db: Database,
    config: EngineConfig,
    rng: StdRng,
}

impl GameService {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self {
            db,
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// A service whose battle rolls are reproducible.
    pub fn with_seed(db: Database, config: EngineConfig, seed: u64) -> Self {
        Self {
            db,
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn open(path: &Path, config: EngineConfig) -> Result<Self> {
        Ok(Self::new(Database::new(path)?, config))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a character, apply `op`, save and commit. Business rule failures
    /// are logged at warn level and returned unchanged.
    fn transact<T>(
        &mut self,
        action: &str,
        character_id: CharacterId,
        op: impl FnOnce(&Database, &Connection, &mut Character, &EngineConfig, &mut StdRng) -> Result<T>,
    ) -> Result<(Character, T)> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = self
            .db
            .load_character(&tx, character_id)
            .and_then(|mut character| {
                let value = op(&self.db, &tx, &mut character, &self.config, &mut self.rng)?;
                Ok((character, value))
            });

        let (character, value) = match result {
            Ok(done) => done,
            Err(e) => {
                if e.is_business() {
                    tracing::warn!("{} rejected for character {}: {}", action, character_id, e);
                }
                return Err(e);
            }
        };

        self.db.save_character(&tx, &character)?;
        tx.commit()?;
        Ok((character, value))
    }

    /// Create a level 1 character with the configured starting values.
    pub fn register_character(&mut self, login_id: &str, name: &str) -> Result<Character> {
        let login_id = login_id.trim();
        let name = name.trim();
        if login_id.is_empty() || name.is_empty() {
            return Err(GameError::InvalidOperation(
                "Login id and character name must not be empty".to_string(),
            ));
        }

        let starting = &self.config.starting;
        let mut character = Character::new(
            0,
            login_id,
            name,
            starting.base_stats(),
            starting.gold,
            starting.stat_points,
        );

        let mut conn = self.db.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        character.id = match self.db.insert_character(&tx, &character) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Registration of {} rejected: {}", login_id, e);
                return Err(e);
            }
        };
        tx.commit()?;

        tracing::info!("Registered character {} ({}) as id {}", name, login_id, character.id);
        Ok(character)
    }

    pub fn character(&self, character_id: CharacterId) -> Result<Character> {
        let conn = self.db.connection()?;
        self.db.load_character(&conn, character_id)
    }

    pub fn character_by_login(&self, login_id: &str) -> Result<Character> {
        let conn = self.db.connection()?;
        let id = self.db.character_id_by_login(&conn, login_id)?;
        self.db.load_character(&conn, id)
    }

    /// Pick the next monster on the character's floor. Nothing is persisted;
    /// the returned snapshot carries the encounter's HP.
    pub fn start_encounter(&mut self, character_id: CharacterId) -> Result<MonsterSnapshot> {
        let conn = self.db.connection()?;
        let character = self.db.load_character(&conn, character_id)?;
        let monsters = self.db.monsters_on_floor(&conn, character.floor)?;
        let monster = encounter::spawn_encounter(&character, &monsters, &self.config.battle, &mut self.rng)?;

        tracing::debug!(
            "Character {} encounters {} on floor {}",
            character_id,
            monster.name,
            character.floor
        );
        Ok(MonsterSnapshot::new(monster.clone(), &monster.instantiate()))
    }

    /// Resolve one attack turn against a monster instance.
    pub fn resolve_attack(&mut self, character_id: CharacterId, instance: MonsterInstance) -> Result<TurnReport> {
        let (character, (monster, outcome)) =
            self.transact("Attack", character_id, |db, conn, character, config, rng| {
                let monster = db.monster(conn, instance.template_id)?;
                let outcome = battle::resolve_attack(character, &monster, &instance, config, rng)?;
                Ok((monster, outcome))
            })?;

        if outcome.player_won() {
            tracing::info!("Character {} defeated {}", character_id, monster.name);
        } else if outcome.battle_over() {
            tracing::info!("Character {} was defeated by {}", character_id, monster.name);
        }
        for event in &outcome.events {
            match event {
                BattleEvent::LevelUp { level } => {
                    tracing::info!("Character {} reached level {}", character_id, level)
                }
                BattleEvent::BossDefeated { floor } => {
                    tracing::info!("Character {} cleared floor {}", character_id, floor)
                }
                _ => {}
            }
        }

        Ok(TurnReport {
            character,
            monster: MonsterSnapshot::new(monster, &outcome.monster),
            battle_over: outcome.battle_over(),
            player_won: outcome.player_won(),
            events: outcome.events,
        })
    }

    pub fn buy_item(&mut self, character_id: CharacterId, item_id: ItemId, quantity: u32) -> Result<Character> {
        let (character, (item, entry_id)) =
            self.transact("Purchase", character_id, |db, conn, character, _, _| {
                let item = db.item(conn, item_id)?;
                let entry_id = inventory::buy(character, &item, quantity)?;
                Ok((item, entry_id))
            })?;
        tracing::info!(
            "Character {} bought {} x {} into entry {}",
            character_id,
            quantity,
            item.name,
            entry_id
        );
        Ok(character)
    }

    pub fn sell_item(&mut self, character_id: CharacterId, entry_id: EntryId, quantity: u32) -> Result<Character> {
        let (character, earned) = self.transact("Sale", character_id, |_, _, character, config, _| {
            inventory::sell(character, entry_id, quantity, &config.economy)
        })?;
        tracing::info!(
            "Character {} sold {} from entry {} for {} gold",
            character_id,
            quantity,
            entry_id,
            earned
        );
        Ok(character)
    }

    pub fn use_item(&mut self, character_id: CharacterId, entry_id: EntryId) -> Result<Character> {
        let (character, restored) = self.transact("Item use", character_id, |_, _, character, _, _| {
            inventory::use_item(character, entry_id)
        })?;
        tracing::info!(
            "Character {} used entry {}: +{} HP, +{} MP",
            character_id,
            entry_id,
            restored.heal,
            restored.mana
        );
        Ok(character)
    }

    pub fn toggle_equip(&mut self, character_id: CharacterId, entry_id: EntryId) -> Result<Character> {
        let (character, equipped) = self.transact("Equip toggle", character_id, |_, _, character, _, _| {
            inventory::toggle_equip(character, entry_id)
        })?;
        tracing::info!(
            "Character {} {} entry {}",
            character_id,
            if equipped { "equipped" } else { "unequipped" },
            entry_id
        );
        Ok(character)
    }

    pub fn allocate_stat_points(
        &mut self,
        character_id: CharacterId,
        allocation: &StatAllocation,
    ) -> Result<Character> {
        let (character, ()) = self.transact("Stat allocation", character_id, |_, _, character, _, _| {
            progression::allocate_stat_points(character, allocation)
        })?;
        tracing::info!("Character {} allocated {:?}", character_id, allocation);
        Ok(character)
    }

    pub fn learn_skill(&mut self, character_id: CharacterId, skill_id: SkillId) -> Result<Character> {
        let (character, learned) = self.transact("Skill learning", character_id, |db, conn, character, _, _| {
            let skill = db.skill(conn, skill_id)?;
            Ok(progression::learn_skill(character, &skill))
        })?;
        if learned {
            tracing::info!("Character {} learned skill {}", character_id, skill_id);
        }
        Ok(character)
    }

    /// Descend to the next floor once the current floor's boss has fallen.
    pub fn advance_floor(&mut self, character_id: CharacterId) -> Result<Character> {
        let (character, floor) = self.transact("Floor advance", character_id, |db, conn, character, _, _| {
            let next_floor = db.monsters_on_floor(conn, character.floor + 1)?;
            encounter::advance_floor(character, !next_floor.is_empty())
        })?;
        tracing::info!("Character {} advanced to floor {}", character_id, floor);
        Ok(character)
    }

    pub fn items(&self) -> Result<Vec<Item>> {
        let conn = self.db.connection()?;
        self.db.items(&conn)
    }

    pub fn monsters(&self) -> Result<Vec<Monster>> {
        let conn = self.db.connection()?;
        self.db.monsters(&conn)
    }

    pub fn skills(&self) -> Result<Vec<Skill>> {
        let conn = self.db.connection()?;
        self.db.skills(&conn)
    }

    /// Insert the built-in templates into whichever template tables are empty.
    pub fn seed_defaults(&self) -> Result<SeedReport> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut report = SeedReport::default();

        if !self.db.has_items(&tx)? {
            for item in seed::default_items() {
                self.db.insert_item(&tx, &item)?;
                report.items += 1;
            }
        }
        if !self.db.has_monsters(&tx)? {
            for monster in seed::default_monsters() {
                self.db.insert_monster(&tx, &monster)?;
                report.monsters += 1;
            }
        }
        if !self.db.has_skills(&tx)? {
            for skill in seed::default_skills() {
                self.db.insert_skill(&tx, &skill)?;
                report.skills += 1;
            }
        }

        tx.commit()?;
        tracing::info!(
            "Seeded {} items, {} monsters and {} skills",
            report.items,
            report.monsters,
            report.skills
        );
        Ok(report)
    }
}
