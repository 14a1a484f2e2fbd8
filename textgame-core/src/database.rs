use crate::error::{GameError, Result};
use crate::models::{
    Character, CharacterId, EquipBonus, InventoryEntry, Item, ItemId, ItemKind, ItemType, Monster,
    MonsterId, Restore, Skill, SkillId, Stats,
};
use crate::stats::recompute_final_stats;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};

const ITEM_COLUMNS: &str = "i.id, i.name, i.description, i.icon, i.type, i.attack_boost, \
     i.defense_boost, i.health_boost, i.mana_boost, i.heal_amount, i.mana_restore_amount, i.price";

const MONSTER_COLUMNS: &str = "id, name, floor, is_boss, reward_exp, reward_gold, \
     max_hp, max_mp, atk, def, dex, luk, icon";

const SKILL_COLUMNS: &str =
    "s.id, s.name, s.description, s.icon, s.damage, s.mana_cost, s.cooldown, s.is_healing, s.heal_amount";

const CHARACTER_COLUMNS: &str = "id, login_id, name, level, experience, gold, floor, floor_kills, \
     cleared_floor, stat_points, current_hp, current_mp, base_max_hp, base_max_mp, base_atk, \
     base_def, base_dex, base_luk, next_entry_id";

impl ToSql for ItemType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ItemType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: GameError| FromSqlError::Other(Box::new(e)))
    }
}

/// Map an item row whose columns follow `ITEM_COLUMNS`, starting at `offset`.
fn item_from_row(row: &Row, offset: usize) -> rusqlite::Result<Item> {
    let item_type: ItemType = row.get(offset + 4)?;
    let bonus = EquipBonus {
        attack: row.get(offset + 5)?,
        defense: row.get(offset + 6)?,
        health: row.get(offset + 7)?,
        mana: row.get(offset + 8)?,
    };
    let restore = Restore {
        heal: row.get(offset + 9)?,
        mana: row.get(offset + 10)?,
    };
    Ok(Item {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        description: row.get(offset + 2)?,
        icon: row.get(offset + 3)?,
        kind: ItemKind::from_columns(item_type, bonus, restore),
        price: row.get(offset + 11)?,
    })
}

fn monster_from_row(row: &Row) -> rusqlite::Result<Monster> {
    Ok(Monster {
        id: row.get(0)?,
        name: row.get(1)?,
        floor: row.get(2)?,
        is_boss: row.get(3)?,
        reward_exp: row.get(4)?,
        reward_gold: row.get(5)?,
        stats: Stats {
            max_hp: row.get(6)?,
            max_mp: row.get(7)?,
            atk: row.get(8)?,
            def: row.get(9)?,
            dex: row.get(10)?,
            luk: row.get(11)?,
        },
        icon: row.get(12)?,
    })
}

fn skill_from_row(row: &Row) -> rusqlite::Result<Skill> {
    Ok(Skill {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        damage: row.get(4)?,
        mana_cost: row.get(5)?,
        cooldown: row.get(6)?,
        is_healing: row.get(7)?,
        heal_amount: row.get(8)?,
    })
}

fn character_from_row(row: &Row) -> rusqlite::Result<Character> {
    let base = Stats {
        max_hp: row.get(12)?,
        max_mp: row.get(13)?,
        atk: row.get(14)?,
        def: row.get(15)?,
        dex: row.get(16)?,
        luk: row.get(17)?,
    };
    Ok(Character {
        id: row.get(0)?,
        login_id: row.get(1)?,
        name: row.get(2)?,
        level: row.get(3)?,
        experience: row.get(4)?,
        gold: row.get(5)?,
        floor: row.get(6)?,
        floor_kills: row.get(7)?,
        cleared_floor: row.get(8)?,
        stat_points: row.get(9)?,
        current_hp: row.get(10)?,
        current_mp: row.get(11)?,
        base,
        stats: base,
        skills: Vec::new(),
        inventory: Vec::new(),
        next_entry_id: row.get(18)?,
    })
}

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    pub fn new(path: &std::path::Path) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| {
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(())
            });
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(GameError::Pool)?;

        let db = Self { pool };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(GameError::Pool)
    }

    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.connection()?;

        let tx = conn.transaction()?;

        tx.execute_batch(
            r#"
            -- Templates
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                icon TEXT NOT NULL DEFAULT '',
                type TEXT NOT NULL CHECK(type IN ('WEAPON', 'ARMOR', 'POTION', 'CONSUMABLE', 'KEY', 'ETC')),
                attack_boost INTEGER NOT NULL DEFAULT 0,
                defense_boost INTEGER NOT NULL DEFAULT 0,
                health_boost INTEGER NOT NULL DEFAULT 0,
                mana_boost INTEGER NOT NULL DEFAULT 0,
                heal_amount INTEGER NOT NULL DEFAULT 0,
                mana_restore_amount INTEGER NOT NULL DEFAULT 0,
                price INTEGER NOT NULL CHECK(price >= 0)
            );

            CREATE TABLE IF NOT EXISTS monsters (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                floor INTEGER NOT NULL CHECK(floor >= 1),
                is_boss BOOLEAN NOT NULL DEFAULT FALSE,
                reward_exp INTEGER NOT NULL DEFAULT 0,
                reward_gold INTEGER NOT NULL DEFAULT 0,
                max_hp INTEGER NOT NULL CHECK(max_hp > 0),
                max_mp INTEGER NOT NULL DEFAULT 0,
                atk INTEGER NOT NULL,
                def INTEGER NOT NULL,
                dex INTEGER NOT NULL,
                luk INTEGER NOT NULL,
                icon TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_monsters_floor ON monsters(floor);

            CREATE TABLE IF NOT EXISTS skills (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                icon TEXT NOT NULL DEFAULT '',
                damage INTEGER NOT NULL DEFAULT 0,
                mana_cost INTEGER NOT NULL DEFAULT 0,
                cooldown INTEGER NOT NULL DEFAULT 0,
                is_healing BOOLEAN NOT NULL DEFAULT FALSE,
                heal_amount INTEGER NOT NULL DEFAULT 0
            );

            -- Characters
            CREATE TABLE IF NOT EXISTS characters (
                id INTEGER PRIMARY KEY,
                login_id TEXT UNIQUE NOT NULL,
                name TEXT UNIQUE NOT NULL,
                level INTEGER NOT NULL CHECK(level >= 1),
                experience INTEGER NOT NULL CHECK(experience >= 0),
                gold INTEGER NOT NULL CHECK(gold >= 0),
                floor INTEGER NOT NULL CHECK(floor >= 1),
                floor_kills INTEGER NOT NULL DEFAULT 0,
                cleared_floor INTEGER NOT NULL DEFAULT 0,
                stat_points INTEGER NOT NULL CHECK(stat_points >= 0),
                current_hp INTEGER NOT NULL,
                current_mp INTEGER NOT NULL,
                base_max_hp INTEGER NOT NULL,
                base_max_mp INTEGER NOT NULL,
                base_atk INTEGER NOT NULL,
                base_def INTEGER NOT NULL,
                base_dex INTEGER NOT NULL,
                base_luk INTEGER NOT NULL,
                max_hp INTEGER NOT NULL,
                max_mp INTEGER NOT NULL,
                atk INTEGER NOT NULL,
                def INTEGER NOT NULL,
                dex INTEGER NOT NULL,
                luk INTEGER NOT NULL,
                next_entry_id INTEGER NOT NULL DEFAULT 1,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS inventory_entries (
                character_id INTEGER NOT NULL,
                entry_id INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL CHECK(quantity > 0),
                equipped BOOLEAN NOT NULL DEFAULT FALSE,
                PRIMARY KEY (character_id, entry_id),
                UNIQUE(character_id, item_id),
                FOREIGN KEY (character_id) REFERENCES characters(id) ON DELETE CASCADE,
                FOREIGN KEY (item_id) REFERENCES items(id)
            );

            CREATE TABLE IF NOT EXISTS character_skills (
                character_id INTEGER NOT NULL,
                skill_id INTEGER NOT NULL,
                PRIMARY KEY (character_id, skill_id),
                FOREIGN KEY (character_id) REFERENCES characters(id) ON DELETE CASCADE,
                FOREIGN KEY (skill_id) REFERENCES skills(id)
            );
            "#,
        )?;

        tx.commit()?;
        Ok(())
    }

    fn row_count(&self, conn: &Connection, table: &'static str) -> Result<i64> {
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn has_items(&self, conn: &Connection) -> Result<bool> {
        Ok(self.row_count(conn, "items")? > 0)
    }

    pub fn has_monsters(&self, conn: &Connection) -> Result<bool> {
        Ok(self.row_count(conn, "monsters")? > 0)
    }

    pub fn has_skills(&self, conn: &Connection) -> Result<bool> {
        Ok(self.row_count(conn, "skills")? > 0)
    }

    // Template methods

    /// Insert an item template. Returns its new id.
    pub fn insert_item(&self, conn: &Connection, item: &Item) -> Result<ItemId> {
        let existing: Option<ItemId> = conn
            .query_row("SELECT id FROM items WHERE name = ?", params![item.name], |row| row.get(0))
            .optional()?;
        if existing.is_some() {
            return Err(GameError::DuplicateEntry(format!("Item named {}", item.name)));
        }

        let bonus = item.kind.equip_bonus().copied().unwrap_or_default();
        let restore = item.kind.restore().copied().unwrap_or_default();
        conn.execute(
            "INSERT INTO items (name, description, icon, type, attack_boost, defense_boost,
                                health_boost, mana_boost, heal_amount, mana_restore_amount, price)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                item.name,
                item.description,
                item.icon,
                item.item_type(),
                bonus.attack,
                bonus.defense,
                bonus.health,
                bonus.mana,
                restore.heal,
                restore.mana,
                item.price,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn item(&self, conn: &Connection, id: ItemId) -> Result<Item> {
        conn.query_row(
            &format!("SELECT {} FROM items i WHERE i.id = ?", ITEM_COLUMNS),
            params![id],
            |row| item_from_row(row, 0),
        )
        .optional()?
        .ok_or_else(|| GameError::NotFound(format!("Item {}", id)))
    }

    pub fn items(&self, conn: &Connection) -> Result<Vec<Item>> {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM items i ORDER BY i.id", ITEM_COLUMNS))?;
        let items = stmt
            .query_map([], |row| item_from_row(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Insert a monster template. Returns its new id.
    pub fn insert_monster(&self, conn: &Connection, monster: &Monster) -> Result<MonsterId> {
        conn.execute(
            "INSERT INTO monsters (name, floor, is_boss, reward_exp, reward_gold,
                                   max_hp, max_mp, atk, def, dex, luk, icon)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                monster.name,
                monster.floor,
                monster.is_boss,
                monster.reward_exp,
                monster.reward_gold,
                monster.stats.max_hp,
                monster.stats.max_mp,
                monster.stats.atk,
                monster.stats.def,
                monster.stats.dex,
                monster.stats.luk,
                monster.icon,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn monster(&self, conn: &Connection, id: MonsterId) -> Result<Monster> {
        conn.query_row(
            &format!("SELECT {} FROM monsters WHERE id = ?", MONSTER_COLUMNS),
            params![id],
            monster_from_row,
        )
        .optional()?
        .ok_or_else(|| GameError::NotFound(format!("Monster {}", id)))
    }

    pub fn monsters(&self, conn: &Connection) -> Result<Vec<Monster>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM monsters ORDER BY floor, is_boss, id",
            MONSTER_COLUMNS
        ))?;
        let monsters = stmt
            .query_map([], monster_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(monsters)
    }

    pub fn monsters_on_floor(&self, conn: &Connection, floor: u32) -> Result<Vec<Monster>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM monsters WHERE floor = ? ORDER BY is_boss, id",
            MONSTER_COLUMNS
        ))?;
        let monsters = stmt
            .query_map(params![floor], monster_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(monsters)
    }

    /// Insert a skill template. Returns its new id.
    pub fn insert_skill(&self, conn: &Connection, skill: &Skill) -> Result<SkillId> {
        let existing: Option<SkillId> = conn
            .query_row("SELECT id FROM skills WHERE name = ?", params![skill.name], |row| row.get(0))
            .optional()?;
        if existing.is_some() {
            return Err(GameError::DuplicateEntry(format!("Skill named {}", skill.name)));
        }

        conn.execute(
            "INSERT INTO skills (name, description, icon, damage, mana_cost, cooldown, is_healing, heal_amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                skill.name,
                skill.description,
                skill.icon,
                skill.damage,
                skill.mana_cost,
                skill.cooldown,
                skill.is_healing,
                skill.heal_amount,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn skill(&self, conn: &Connection, id: SkillId) -> Result<Skill> {
        conn.query_row(
            &format!("SELECT {} FROM skills s WHERE s.id = ?", SKILL_COLUMNS),
            params![id],
            skill_from_row,
        )
        .optional()?
        .ok_or_else(|| GameError::NotFound(format!("Skill {}", id)))
    }

    pub fn skills(&self, conn: &Connection) -> Result<Vec<Skill>> {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM skills s ORDER BY s.id", SKILL_COLUMNS))?;
        let skills = stmt
            .query_map([], skill_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(skills)
    }

    // Character methods

    /// Insert a new character row, rejecting a taken login id or name.
    /// Returns the assigned id.
    pub fn insert_character(&self, conn: &Connection, character: &Character) -> Result<CharacterId> {
        let taken: Option<String> = conn
            .query_row(
                "SELECT login_id FROM characters WHERE login_id = ?1 OR name = ?2",
                params![character.login_id, character.name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(login_id) = taken {
            return Err(GameError::DuplicateEntry(if login_id == character.login_id {
                format!("Login id {}", character.login_id)
            } else {
                format!("Character name {}", character.name)
            }));
        }

        let stats = character.stats();
        conn.execute(
            "INSERT INTO characters (
                login_id, name, level, experience, gold, floor, floor_kills, cleared_floor,
                stat_points, current_hp, current_mp, base_max_hp, base_max_mp, base_atk,
                base_def, base_dex, base_luk, max_hp, max_mp, atk, def, dex, luk, next_entry_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                character.login_id,
                character.name,
                character.level,
                character.experience,
                character.gold,
                character.floor,
                character.floor_kills,
                character.cleared_floor,
                character.stat_points,
                character.current_hp,
                character.current_mp,
                character.base.max_hp,
                character.base.max_mp,
                character.base.atk,
                character.base.def,
                character.base.dex,
                character.base.luk,
                stats.max_hp,
                stats.max_mp,
                stats.atk,
                stats.def,
                stats.dex,
                stats.luk,
                character.next_entry_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn character_id_by_login(&self, conn: &Connection, login_id: &str) -> Result<CharacterId> {
        conn.query_row(
            "SELECT id FROM characters WHERE login_id = ?",
            params![login_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| GameError::NotFound(format!("Character with login id {}", login_id)))
    }

    /// Load a character with inventory and skills, and recompute its final
    /// stats from what is equipped.
    pub fn load_character(&self, conn: &Connection, id: CharacterId) -> Result<Character> {
        let mut character = conn
            .query_row(
                &format!("SELECT {} FROM characters WHERE id = ?", CHARACTER_COLUMNS),
                params![id],
                character_from_row,
            )
            .optional()?
            .ok_or_else(|| GameError::NotFound(format!("Character {}", id)))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT ie.entry_id, ie.quantity, ie.equipped, {}
             FROM inventory_entries ie
             JOIN items i ON i.id = ie.item_id
             WHERE ie.character_id = ?
             ORDER BY ie.entry_id",
            ITEM_COLUMNS
        ))?;
        character.inventory = stmt
            .query_map(params![id], |row| {
                Ok(InventoryEntry {
                    id: row.get(0)?,
                    quantity: row.get(1)?,
                    equipped: row.get(2)?,
                    item: item_from_row(row, 3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {}
             FROM character_skills cs
             JOIN skills s ON s.id = cs.skill_id
             WHERE cs.character_id = ?
             ORDER BY s.id",
            SKILL_COLUMNS
        ))?;
        character.skills = stmt
            .query_map(params![id], skill_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        recompute_final_stats(&mut character);
        Ok(character)
    }

    /// Write a character back, replacing its inventory and skill rows.
    pub fn save_character(&self, conn: &Connection, character: &Character) -> Result<()> {
        let stats = character.stats();
        let updated = conn.execute(
            "UPDATE characters SET
                level = ?, experience = ?, gold = ?, floor = ?, floor_kills = ?, cleared_floor = ?,
                stat_points = ?, current_hp = ?, current_mp = ?, base_max_hp = ?, base_max_mp = ?,
                base_atk = ?, base_def = ?, base_dex = ?, base_luk = ?, max_hp = ?, max_mp = ?,
                atk = ?, def = ?, dex = ?, luk = ?, next_entry_id = ?
             WHERE id = ?",
            params![
                character.level,
                character.experience,
                character.gold,
                character.floor,
                character.floor_kills,
                character.cleared_floor,
                character.stat_points,
                character.current_hp,
                character.current_mp,
                character.base.max_hp,
                character.base.max_mp,
                character.base.atk,
                character.base.def,
                character.base.dex,
                character.base.luk,
                stats.max_hp,
                stats.max_mp,
                stats.atk,
                stats.def,
                stats.dex,
                stats.luk,
                character.next_entry_id,
                character.id,
            ],
        )?;
        if updated == 0 {
            return Err(GameError::NotFound(format!("Character {}", character.id)));
        }

        conn.execute(
            "DELETE FROM inventory_entries WHERE character_id = ?",
            params![character.id],
        )?;
        for entry in &character.inventory {
            conn.execute(
                "INSERT INTO inventory_entries (character_id, entry_id, item_id, quantity, equipped)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![character.id, entry.id, entry.item.id, entry.quantity, entry.equipped],
            )?;
        }

        conn.execute(
            "DELETE FROM character_skills WHERE character_id = ?",
            params![character.id],
        )?;
        for skill in &character.skills {
            conn.execute(
                "INSERT INTO character_skills (character_id, skill_id) VALUES (?1, ?2)",
                params![character.id, skill.id],
            )?;
        }

        Ok(())
    }
}
