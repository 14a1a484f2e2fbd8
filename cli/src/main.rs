use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use textgame_core::models::{Character, EntryId, ItemId, MonsterId, MonsterInstance, MonsterSnapshot, SkillId};
use textgame_core::{EngineConfig, GameService, StatAllocation, TurnReport};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const MAX_FIGHT_TURNS: usize = 1000;

#[derive(Parser)]
#[command(
    name = "textgame",
    version = "0.1.0",
    about = "Text dungeon game: battles, character progression and the item shop",
    long_about = None
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true, default_value = "./textgame.sqlite")]
    database: std::path::PathBuf,

    /// Path to engine configuration (TOML)
    #[arg(long, global = true, env = "TEXTGAME_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/textgame.log")]
    log_file: std::path::PathBuf,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema and insert the built-in monsters, items and skills
    Init,

    /// Register a new character
    Register {
        /// Login id
        login: String,
        /// Display name
        name: String,
    },

    /// Show a character
    Show { login: String },

    /// List item templates
    Items,

    /// List monster templates
    Monsters,

    /// List skill templates
    Skills,

    /// Buy an item from the shop
    Buy {
        login: String,
        item: ItemId,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// Sell units from an inventory entry
    Sell {
        login: String,
        entry: EntryId,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// Use a potion or consumable
    Use { login: String, entry: EntryId },

    /// Equip or unequip a weapon or armor
    Equip { login: String, entry: EntryId },

    /// Spend stat points
    Allocate {
        login: String,
        #[arg(long, default_value_t = 0)]
        atk: u32,
        #[arg(long, default_value_t = 0)]
        def: u32,
        #[arg(long, default_value_t = 0)]
        dex: u32,
        #[arg(long, default_value_t = 0)]
        luk: u32,
    },

    /// Learn a skill
    Learn { login: String, skill: SkillId },

    /// Meet the next monster on the character's floor
    Encounter { login: String },

    /// Attack a monster once, passing its current HP
    Attack {
        login: String,
        #[arg(long)]
        monster: MonsterId,
        #[arg(long)]
        hp: u32,
    },

    /// Start an encounter and attack until the battle ends
    Fight { login: String },

    /// Descend to the next floor after its boss has fallen
    Advance { login: String },
}

fn setup_logging(verbose: u8, log_file: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(std::path::Path::new(".")),
        log_file.file_name().unwrap_or(std::ffi::OsStr::new("textgame.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_character(character: &Character) {
    let stats = character.stats();
    println!(
        "{} ({}) - level {}, floor {}",
        character.name, character.login_id, character.level, character.floor
    );
    println!(
        "  HP {}/{}  MP {}/{}  EXP {}  Gold {}",
        character.current_hp, stats.max_hp, character.current_mp, stats.max_mp, character.experience, character.gold
    );
    println!(
        "  ATK {}  DEF {}  DEX {}  LUK {}  Stat points {}",
        stats.atk, stats.def, stats.dex, stats.luk, character.stat_points
    );
    println!(
        "  Floor kills {}  Cleared floor {}",
        character.floor_kills, character.cleared_floor
    );
    if !character.inventory.is_empty() {
        println!("  Inventory:");
        for entry in &character.inventory {
            println!(
                "    [{}] {} x{} ({}){}",
                entry.id,
                entry.item.name,
                entry.quantity,
                entry.item.item_type(),
                if entry.equipped { " [equipped]" } else { "" }
            );
        }
    }
    if !character.skills.is_empty() {
        let names: Vec<&str> = character.skills.iter().map(|s| s.name.as_str()).collect();
        println!("  Skills: {}", names.join(", "));
    }
}

fn print_monster(monster: &MonsterSnapshot) {
    let template = &monster.template;
    println!(
        "{} {} (id {}{}) - HP {}/{}  ATK {}  DEF {}",
        template.icon,
        template.name,
        template.id,
        if template.is_boss { ", boss" } else { "" },
        monster.current_hp,
        template.stats.max_hp,
        template.stats.atk,
        template.stats.def
    );
}

fn print_turn(report: &TurnReport) {
    for message in report.messages() {
        println!("{}", message);
    }
    if !report.battle_over {
        print_monster(&report.monster);
    }
}

/// Print a character snapshot in the chosen format.
fn report_character(character: &Character, json: bool) -> Result<()> {
    if json {
        print_json(character)
    } else {
        print_character(character);
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    info!("Starting textgame CLI");

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let mut service = GameService::open(&cli.database, config)?;
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            let report = service.seed_defaults()?;
            if json {
                print_json(&report)?;
            } else {
                println!(
                    "Database ready at {:?}: seeded {} items, {} monsters, {} skills",
                    cli.database, report.items, report.monsters, report.skills
                );
            }
        }
        Commands::Register { login, name } => {
            let character = service.register_character(&login, &name)?;
            report_character(&character, json)?;
        }
        Commands::Show { login } => {
            let character = service.character_by_login(&login)?;
            report_character(&character, json)?;
        }
        Commands::Items => {
            let items = service.items()?;
            if json {
                print_json(&items)?;
            } else {
                for item in items {
                    println!(
                        "[{}] {} {} ({}) - {} gold: {}",
                        item.id,
                        item.icon,
                        item.name,
                        item.item_type(),
                        item.price,
                        item.description
                    );
                }
            }
        }
        Commands::Monsters => {
            let monsters = service.monsters()?;
            if json {
                print_json(&monsters)?;
            } else {
                for monster in monsters {
                    println!(
                        "[{}] floor {} {} {}{} - HP {}  ATK {}  DEF {}  reward {} EXP / {} gold",
                        monster.id,
                        monster.floor,
                        monster.icon,
                        monster.name,
                        if monster.is_boss { " (boss)" } else { "" },
                        monster.stats.max_hp,
                        monster.stats.atk,
                        monster.stats.def,
                        monster.reward_exp,
                        monster.reward_gold
                    );
                }
            }
        }
        Commands::Skills => {
            let skills = service.skills()?;
            if json {
                print_json(&skills)?;
            } else {
                for skill in skills {
                    println!(
                        "[{}] {} {} - {} MP: {}",
                        skill.id, skill.icon, skill.name, skill.mana_cost, skill.description
                    );
                }
            }
        }
        Commands::Buy { login, item, quantity } => {
            let id = service.character_by_login(&login)?.id;
            let character = service.buy_item(id, item, quantity)?;
            report_character(&character, json)?;
        }
        Commands::Sell { login, entry, quantity } => {
            let id = service.character_by_login(&login)?.id;
            let character = service.sell_item(id, entry, quantity)?;
            report_character(&character, json)?;
        }
        Commands::Use { login, entry } => {
            let id = service.character_by_login(&login)?.id;
            let character = service.use_item(id, entry)?;
            report_character(&character, json)?;
        }
        Commands::Equip { login, entry } => {
            let id = service.character_by_login(&login)?.id;
            let character = service.toggle_equip(id, entry)?;
            report_character(&character, json)?;
        }
        Commands::Allocate { login, atk, def, dex, luk } => {
            let allocation = StatAllocation { atk, def, dex, luk };
            if allocation.total() == Some(0) {
                anyhow::bail!("Nothing to allocate; pass at least one of --atk, --def, --dex, --luk");
            }
            let id = service.character_by_login(&login)?.id;
            let character = service.allocate_stat_points(id, &allocation)?;
            report_character(&character, json)?;
        }
        Commands::Learn { login, skill } => {
            let id = service.character_by_login(&login)?.id;
            let character = service.learn_skill(id, skill)?;
            report_character(&character, json)?;
        }
        Commands::Encounter { login } => {
            let id = service.character_by_login(&login)?.id;
            let monster = service.start_encounter(id)?;
            if json {
                print_json(&monster)?;
            } else {
                print_monster(&monster);
                println!(
                    "Attack with: textgame attack {} --monster {} --hp {}",
                    login, monster.template.id, monster.current_hp
                );
            }
        }
        Commands::Attack { login, monster, hp } => {
            let id = service.character_by_login(&login)?.id;
            let report = service.resolve_attack(id, MonsterInstance { template_id: monster, current_hp: hp })?;
            if json {
                print_json(&report)?;
            } else {
                print_turn(&report);
            }
        }
        Commands::Fight { login } => {
            let id = service.character_by_login(&login)?.id;
            let mut monster = service.start_encounter(id)?;
            if !json {
                print_monster(&monster);
            }
            let mut turns = Vec::new();
            loop {
                let report = service.resolve_attack(id, monster.instance())?;
                if !json {
                    print_turn(&report);
                }
                monster = report.monster.clone();
                let over = report.battle_over;
                turns.push(report);
                if over {
                    break;
                }
                if turns.len() >= MAX_FIGHT_TURNS {
                    anyhow::bail!("Fight stopped after {} turns without a result", MAX_FIGHT_TURNS);
                }
            }
            info!("Fight for {} ended after {} turns", login, turns.len());
            if json {
                print_json(&turns)?;
            }
        }
        Commands::Advance { login } => {
            let id = service.character_by_login(&login)?.id;
            let character = service.advance_floor(id)?;
            report_character(&character, json)?;
        }
    }

    Ok(())
}
