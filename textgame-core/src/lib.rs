//! Core library for the text dungeon game: battle resolution, character
//! progression, inventory and gold, with SQLite storage behind a by-id service.

pub mod battle;
pub mod config;
pub mod database;
pub mod economy;
pub mod encounter;
pub mod error;
pub mod inventory;
pub mod models;
pub mod progression;
pub mod seed;
pub mod service;
pub mod stats;

pub use config::EngineConfig;
pub use error::{GameError, Result};
pub use progression::StatAllocation;
pub use service::{GameService, SeedReport, TurnReport};
