//! End-to-end game flows through the service facade against a scratch database.

use tempfile::TempDir;
use textgame_core::battle::BattleEvent;
use textgame_core::config::ExpOverflow;
use textgame_core::database::Database;
use textgame_core::models::{Character, EquipBonus, Item, ItemKind, Monster, Restore, Stats};
use textgame_core::{EngineConfig, GameError, GameService, StatAllocation};

fn no_crits() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.battle.critical_hits = false;
    config
}

fn world(config: EngineConfig) -> (TempDir, GameService) {
    let dir = TempDir::new().unwrap();
    let db = Database::new(&dir.path().join("game.sqlite")).unwrap();
    (dir, GameService::with_seed(db, config, 11))
}

fn monster(floor: u32, is_boss: bool, max_hp: u32, atk: u32, def: u32) -> Monster {
    Monster {
        id: 0,
        name: format!("{} {}-{}", if is_boss { "Boss" } else { "Grunt" }, floor, max_hp),
        floor,
        is_boss,
        reward_exp: 10,
        reward_gold: 50,
        stats: Stats { max_hp, max_mp: 0, atk, def, dex: 5, luk: 5 },
        icon: String::new(),
    }
}

fn insert(service: &GameService, mut monster: Monster) -> Monster {
    let db = service.database();
    let conn = db.connection().unwrap();
    monster.id = db.insert_monster(&conn, &monster).unwrap();
    monster
}

fn add_monster(service: &GameService, floor: u32, is_boss: bool, max_hp: u32, atk: u32, def: u32) -> Monster {
    insert(service, monster(floor, is_boss, max_hp, atk, def))
}

fn add_item(service: &GameService, name: &str, price: u64, kind: ItemKind) -> Item {
    let mut item = Item {
        id: 0,
        name: name.to_string(),
        description: String::new(),
        icon: String::new(),
        price,
        kind,
    };
    let db = service.database();
    let conn = db.connection().unwrap();
    item.id = db.insert_item(&conn, &item).unwrap();
    item
}

fn sword(service: &GameService, name: &str, attack: u32, price: u64) -> Item {
    add_item(
        service,
        name,
        price,
        ItemKind::Weapon(EquipBonus { attack, defense: 0, health: 0, mana: 0 }),
    )
}

fn assert_stats_consistent(character: &Character) {
    let stats = character.stats();
    let bonus = character.equipped().fold(EquipBonus::default(), |mut acc, entry| {
        let b = entry.item.kind.equip_bonus().copied().unwrap_or_default();
        acc.attack += b.attack;
        acc.defense += b.defense;
        acc.health += b.health;
        acc.mana += b.mana;
        acc
    });
    assert_eq!(stats.max_hp, character.base.max_hp + bonus.health);
    assert_eq!(stats.max_mp, character.base.max_mp + bonus.mana);
    assert_eq!(stats.atk, character.base.atk + bonus.attack);
    assert_eq!(stats.def, character.base.def + bonus.defense);
    assert!(character.current_hp <= stats.max_hp);
    assert!(character.current_mp <= stats.max_mp);
}

#[test]
fn test_one_hit_kill_scenario() {
    let (_dir, mut service) = world(no_crits());
    let hero = service.register_character("hero", "Hero").unwrap();
    let goblin = add_monster(&service, 1, false, 5, 4, 3);

    let report = service.resolve_attack(hero.id, goblin.instantiate()).unwrap();

    assert!(report.battle_over);
    assert!(report.player_won);
    assert_eq!(report.monster.current_hp, 0);
    assert_eq!(report.events[0], BattleEvent::PlayerAttack { damage: 7, critical: false });
    assert_eq!(report.character.experience, 10);
    assert_eq!(report.character.gold, 1050);
    assert_eq!(report.character.current_hp, 100);
    assert_eq!(service.character(hero.id).unwrap(), report.character);
}

#[test]
fn test_zero_damage_counter_attack_scenario() {
    let mut config = no_crits();
    config.starting.atk = 2;
    let (_dir, mut service) = world(config);
    let hero = service.register_character("hero", "Hero").unwrap();
    let golem = add_monster(&service, 1, false, 50, 12, 5);

    let report = service.resolve_attack(hero.id, golem.instantiate()).unwrap();

    assert!(!report.battle_over);
    assert_eq!(report.monster.current_hp, 50);
    assert_eq!(
        report.events,
        vec![
            BattleEvent::PlayerAttack { damage: 0, critical: false },
            BattleEvent::MonsterAttack { damage: 12 },
        ]
    );
    assert_eq!(report.character.current_hp, 88);
}

#[test]
fn test_level_up_scenario_under_both_policies() {
    for (overflow, leftover) in [(ExpOverflow::Reset, 0), (ExpOverflow::Carry, 5)] {
        let mut config = no_crits();
        config.progression.overflow = overflow;
        config.starting.atk = 1000;
        let (_dir, mut service) = world(config);
        let hero = service.register_character("hero", "Hero").unwrap();

        let big = insert(&service, Monster { reward_exp: 95, ..monster(1, false, 5, 30, 0) });
        let brute = insert(&service, Monster { reward_exp: 0, ..monster(1, false, 1500, 30, 0) });
        let small = add_monster(&service, 1, false, 6, 30, 0);

        let first = service.resolve_attack(hero.id, big.instantiate()).unwrap();
        assert_eq!(first.character.experience, 95);
        assert_eq!(first.character.level, 1);

        // Take one hit and walk away so the level-up heal is visible.
        let hit = service.resolve_attack(hero.id, brute.instantiate()).unwrap();
        assert!(!hit.battle_over);
        assert_eq!(hit.character.current_hp, 70);

        let report = service.resolve_attack(hero.id, small.instantiate()).unwrap();
        let after = &report.character;
        assert!(report.events.contains(&BattleEvent::LevelUp { level: 2 }));
        assert_eq!(after.level, 2);
        assert_eq!(after.experience, leftover);
        assert_eq!(after.stat_points, 10);
        assert_eq!(after.base.max_hp, 120);
        assert_eq!(after.current_hp, 120);
    }
}

#[test]
fn test_insufficient_funds_scenario() {
    let mut config = EngineConfig::default();
    config.starting.gold = 100;
    let (_dir, mut service) = world(config);
    let hero = service.register_character("hero", "Hero").unwrap();
    let herb = add_item(&service, "Herb", 50, ItemKind::Potion(Restore { heal: 10, mana: 0 }));

    let err = service.buy_item(hero.id, herb.id, 3).unwrap_err();

    assert!(matches!(err, GameError::InsufficientFunds { required: 150, available: 100 }));
    assert!(err.is_business());
    let stored = service.character(hero.id).unwrap();
    assert_eq!(stored.gold, 100);
    assert!(stored.inventory.is_empty());
}

#[test]
fn test_partial_sale_scenario() {
    let (_dir, mut service) = world(EngineConfig::default());
    let hero = service.register_character("hero", "Hero").unwrap();
    let blade = sword(&service, "Blade", 5, 100);

    let bought = service.buy_item(hero.id, blade.id, 3).unwrap();
    assert_eq!(bought.gold, 700);
    let entry = bought.entry_for_item(blade.id).unwrap().id;

    let sold = service.sell_item(hero.id, entry, 2).unwrap();
    assert_eq!(sold.gold, 800);
    assert_eq!(sold.entry(entry).unwrap().quantity, 1);
}

#[test]
fn test_buy_then_sell_everything_is_a_net_loss() {
    let (_dir, mut service) = world(EngineConfig::default());
    let hero = service.register_character("hero", "Hero").unwrap();
    let tonic = add_item(&service, "Tonic", 15, ItemKind::Consumable(Restore { heal: 5, mana: 5 }));

    let bought = service.buy_item(hero.id, tonic.id, 3).unwrap();
    let entry = bought.entry_for_item(tonic.id).unwrap().id;
    let sold = service.sell_item(hero.id, entry, 3).unwrap();

    // 3 x 15 = 45 paid, 3 x floor(15 / 2) = 21 back
    assert_eq!(hero.gold - sold.gold, 45 - 21);
    assert!(sold.entry(entry).is_none());
    assert!(sold.entry_for_item(tonic.id).is_none());

    let rebought = service.buy_item(hero.id, tonic.id, 1).unwrap();
    assert_ne!(rebought.entry_for_item(tonic.id).unwrap().id, entry);
}

#[test]
fn test_one_weapon_equipped_at_a_time() {
    let (_dir, mut service) = world(EngineConfig::default());
    let hero = service.register_character("hero", "Hero").unwrap();
    let dagger = sword(&service, "Dagger", 3, 10);
    let axe = sword(&service, "Axe", 9, 10);
    let vest = add_item(
        &service,
        "Vest",
        10,
        ItemKind::Armor(EquipBonus { attack: 0, defense: 4, health: 25, mana: 0 }),
    );

    service.buy_item(hero.id, dagger.id, 1).unwrap();
    service.buy_item(hero.id, axe.id, 1).unwrap();
    let hero = service.buy_item(hero.id, vest.id, 1).unwrap();
    let dagger_entry = hero.entry_for_item(dagger.id).unwrap().id;
    let axe_entry = hero.entry_for_item(axe.id).unwrap().id;
    let vest_entry = hero.entry_for_item(vest.id).unwrap().id;

    service.toggle_equip(hero.id, dagger_entry).unwrap();
    service.toggle_equip(hero.id, vest_entry).unwrap();
    let hero = service.toggle_equip(hero.id, axe_entry).unwrap();

    let weapons: Vec<_> = hero
        .equipped()
        .filter(|e| matches!(e.item.kind, ItemKind::Weapon(_)))
        .collect();
    assert_eq!(weapons.len(), 1);
    assert_eq!(weapons[0].id, axe_entry);
    assert!(hero.entry(vest_entry).unwrap().equipped);
    assert_eq!(hero.stats().atk, 19);
    assert_eq!(hero.stats().def, 9);
    assert_eq!(hero.stats().max_hp, 125);
    assert_stats_consistent(&hero);

    let err = service.sell_item(hero.id, axe_entry, 1).unwrap_err();
    assert!(matches!(err, GameError::InvalidOperation(_)));
}

#[test]
fn test_toggle_equip_twice_restores_state() {
    let (_dir, mut service) = world(EngineConfig::default());
    let hero = service.register_character("hero", "Hero").unwrap();
    let plate = add_item(
        &service,
        "Plate",
        10,
        ItemKind::Armor(EquipBonus { attack: 0, defense: 10, health: 50, mana: 10 }),
    );
    let hero = service.buy_item(hero.id, plate.id, 1).unwrap();
    let entry = hero.entry_for_item(plate.id).unwrap().id;

    let worn = service.toggle_equip(hero.id, entry).unwrap();
    assert_eq!(worn.stats().max_hp, 150);
    assert_stats_consistent(&worn);

    let back = service.toggle_equip(hero.id, entry).unwrap();
    assert_eq!(back, hero);
    assert_stats_consistent(&back);
}

#[test]
fn test_unequip_clamps_current_hp() {
    let (_dir, mut service) = world(EngineConfig::default());
    let hero = service.register_character("hero", "Hero").unwrap();
    let plate = add_item(
        &service,
        "Plate",
        10,
        ItemKind::Armor(EquipBonus { attack: 0, defense: 10, health: 50, mana: 0 }),
    );
    let potion = add_item(&service, "Big Potion", 5, ItemKind::Potion(Restore { heal: 80, mana: 0 }));
    service.buy_item(hero.id, potion.id, 1).unwrap();
    let hero = service.buy_item(hero.id, plate.id, 1).unwrap();
    let plate_entry = hero.entry_for_item(plate.id).unwrap().id;
    let potion_entry = hero.entry_for_item(potion.id).unwrap().id;

    service.toggle_equip(hero.id, plate_entry).unwrap();
    let healed = service.use_item(hero.id, potion_entry).unwrap();
    assert_eq!(healed.current_hp, 150);
    assert!(healed.entry(potion_entry).is_none());

    let bare = service.toggle_equip(hero.id, plate_entry).unwrap();
    assert_eq!(bare.current_hp, 100);
    assert_stats_consistent(&bare);
}

#[test]
fn test_wrong_item_categories_rejected() {
    let (_dir, mut service) = world(EngineConfig::default());
    let hero = service.register_character("hero", "Hero").unwrap();
    let key = add_item(&service, "Key", 5, ItemKind::Key);
    let blade = sword(&service, "Blade", 5, 10);
    service.buy_item(hero.id, key.id, 1).unwrap();
    let hero = service.buy_item(hero.id, blade.id, 1).unwrap();
    let key_entry = hero.entry_for_item(key.id).unwrap().id;
    let blade_entry = hero.entry_for_item(blade.id).unwrap().id;

    assert!(matches!(
        service.toggle_equip(hero.id, key_entry),
        Err(GameError::InvalidOperation(_))
    ));
    assert!(matches!(
        service.use_item(hero.id, blade_entry),
        Err(GameError::InvalidOperation(_))
    ));
    assert!(matches!(service.use_item(hero.id, 99), Err(GameError::NotFound(_))));
    assert_eq!(service.character(hero.id).unwrap(), hero);
}

#[test]
fn test_entries_belong_to_their_character() {
    let (_dir, mut service) = world(EngineConfig::default());
    let alice = service.register_character("alice", "Alice").unwrap();
    let bob = service.register_character("bob", "Bob").unwrap();
    let blade = sword(&service, "Blade", 5, 10);

    let alice = service.buy_item(alice.id, blade.id, 2).unwrap();
    let entry = alice.entry_for_item(blade.id).unwrap().id;

    let err = service.sell_item(bob.id, entry, 1).unwrap_err();
    assert!(matches!(err, GameError::NotFound(_)));
    assert_eq!(service.character(alice.id).unwrap().entry(entry).unwrap().quantity, 2);
}

#[test]
fn test_stat_allocation_persists() {
    let (_dir, mut service) = world(EngineConfig::default());
    let hero = service.register_character("hero", "Hero").unwrap();

    let err = service
        .allocate_stat_points(hero.id, &StatAllocation { atk: 6, def: 0, dex: 0, luk: 0 })
        .unwrap_err();
    assert!(matches!(err, GameError::InsufficientResource { requested: 6, available: 5 }));

    service
        .allocate_stat_points(hero.id, &StatAllocation { atk: 3, def: 0, dex: 0, luk: 2 })
        .unwrap();
    let stored = service.character(hero.id).unwrap();
    assert_eq!(stored.stat_points, 0);
    assert_eq!(stored.stats().atk, 13);
    assert_eq!(stored.stats().luk, 7);
}

#[test]
fn test_defeat_keeps_gold_and_experience() {
    let (_dir, mut service) = world(no_crits());
    let hero = service.register_character("hero", "Hero").unwrap();
    let ogre = add_monster(&service, 1, false, 1000, 60, 100);

    let mut monster = ogre.instantiate();
    let report = loop {
        let report = service.resolve_attack(hero.id, monster).unwrap();
        if report.battle_over {
            break report;
        }
        monster = report.monster.instance();
    };

    assert!(!report.player_won);
    assert_eq!(report.events.last(), Some(&BattleEvent::Defeat));
    assert_eq!(report.character.current_hp, 0);
    assert_eq!(report.character.gold, 1000);
    assert_eq!(report.character.experience, 0);

    let err = service.resolve_attack(hero.id, ogre.instantiate()).unwrap_err();
    assert!(matches!(err, GameError::InvalidOperation(_)));
}

#[test]
fn test_boss_unlocks_next_floor() {
    let mut config = no_crits();
    config.starting.atk = 1000;
    config.battle.boss_kill_threshold = 2;
    let (_dir, mut service) = world(config);
    let hero = service.register_character("hero", "Hero").unwrap();
    add_monster(&service, 1, false, 10, 1, 0);
    let boss = add_monster(&service, 1, true, 20, 1, 0);
    add_monster(&service, 2, false, 10, 1, 0);

    for _ in 0..2 {
        let monster = service.start_encounter(hero.id).unwrap();
        assert!(!monster.template.is_boss);
        let report = service.resolve_attack(hero.id, monster.instance()).unwrap();
        assert!(report.player_won);
    }
    assert!(matches!(service.advance_floor(hero.id), Err(GameError::InvalidOperation(_))));

    let monster = service.start_encounter(hero.id).unwrap();
    assert_eq!(monster.template.id, boss.id);
    let report = service.resolve_attack(hero.id, monster.instance()).unwrap();
    assert_eq!(report.events.last(), Some(&BattleEvent::BossDefeated { floor: 1 }));
    assert_eq!(report.character.cleared_floor, 1);

    let moved = service.advance_floor(hero.id).unwrap();
    assert_eq!(moved.floor, 2);
    assert_eq!(moved.floor_kills, 0);
    let next = service.start_encounter(hero.id).unwrap();
    assert_eq!(next.template.floor, 2);

    // Floor 2's boss is still standing.
    assert!(matches!(service.advance_floor(hero.id), Err(GameError::InvalidOperation(_))));
}

#[test]
fn test_gold_never_negative_over_random_play() {
    let (_dir, mut service) = world(EngineConfig::default());
    service.seed_defaults().unwrap();
    let hero = service.register_character("hero", "Hero").unwrap();
    let items = service.items().unwrap();

    for round in 0..30u32 {
        let item = &items[round as usize % items.len()];
        let _ = service.buy_item(hero.id, item.id, round % 4 + 1);
        let current = service.character(hero.id).unwrap();
        if let Some(entry) = current.inventory.iter().find(|e| !e.equipped) {
            let _ = service.sell_item(hero.id, entry.id, 1);
        }
        if let Some(entry) = current.inventory.iter().find(|e| e.item.kind.equip_bonus().is_some()) {
            let _ = service.toggle_equip(hero.id, entry.id);
        }
        let current = service.character(hero.id).unwrap();
        assert_stats_consistent(&current);
    }
    // Gold is unsigned; reaching here without a panic means every debit was covered.
    let done = service.character(hero.id).unwrap();
    assert!(done.gold <= 1000);
}

#[test]
fn test_turn_state_reported() {
    let (_dir, mut service) = world(no_crits());
    let hero = service.register_character("hero", "Hero").unwrap();
    let slime = add_monster(&service, 1, false, 100, 1, 0);

    let report = service.resolve_attack(hero.id, slime.instantiate()).unwrap();
    assert!(!report.battle_over);
    assert_eq!(report.monster.current_hp, 90);
    assert_eq!(report.monster.template, slime);
    assert_eq!(
        report.messages()[0],
        format!("You attack {} for 10 damage", slime.name)
    );
}
