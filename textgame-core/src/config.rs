//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock rules:
//! ```toml
//! [starting]
//! gold = 1000
//! stat_points = 5
//!
//! [progression]
//! exp_per_level = 100
//! overflow = "reset"   # or "carry"
//!
//! [battle]
//! critical_hits = true
//! critical_multiplier = 2
//! boss_kill_threshold = 5
//!
//! [economy]
//! sell_percent = 50
//! ```

use crate::error::{GameError, Result};
use crate::models::Stats;
use serde::Deserialize;
use std::path::Path;

/// Values a freshly registered character starts with.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StartingConfig {
    pub gold: u64,
    pub stat_points: u32,
    pub max_hp: u32,
    pub max_mp: u32,
    pub atk: u32,
    pub def: u32,
    pub dex: u32,
    pub luk: u32,
}

impl Default for StartingConfig {
    fn default() -> Self {
        Self {
            gold: 1000,
            stat_points: 5,
            max_hp: 100,
            max_mp: 50,
            atk: 10,
            def: 5,
            dex: 5,
            luk: 5,
        }
    }
}

impl StartingConfig {
    pub fn base_stats(&self) -> Stats {
        Stats {
            max_hp: self.max_hp,
            max_mp: self.max_mp,
            atk: self.atk,
            def: self.def,
            dex: self.dex,
            luk: self.luk,
        }
    }
}

/// What happens to experience left over after a level-up.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpOverflow {
    /// Experience drops to zero, discarding the remainder.
    #[default]
    Reset,
    /// The threshold is subtracted and the remainder carries over.
    Carry,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProgressionConfig {
    pub exp_per_level: u64,
    pub stat_points_per_level: u32,
    pub hp_per_level: u32,
    pub max_level: u32,
    pub overflow: ExpOverflow,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            exp_per_level: 100,
            stat_points_per_level: 5,
            hp_per_level: 20,
            max_level: 100,
            overflow: ExpOverflow::Reset,
        }
    }
}

impl ProgressionConfig {
    /// Experience needed to leave `level`.
    pub fn required_exp(&self, level: u32) -> u64 {
        u64::from(level).saturating_mul(self.exp_per_level)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BattleConfig {
    pub critical_hits: bool,
    pub critical_multiplier: u32,
    /// Regular victories on a floor before its boss shows up.
    pub boss_kill_threshold: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            critical_hits: true,
            critical_multiplier: 2,
            boss_kill_threshold: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EconomyConfig {
    pub sell_percent: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self { sell_percent: 50 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub starting: StartingConfig,
    pub progression: ProgressionConfig,
    pub battle: BattleConfig,
    pub economy: EconomyConfig,
}

impl EngineConfig {
    /// Load engine configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GameError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read engine config from {:?}: {}", path, e),
            ))
        })?;

        Self::from_str(&content)
    }

    /// Parse engine configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| GameError::Config(format!("Failed to parse engine config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.progression.exp_per_level == 0 {
            return Err(GameError::Config("progression.exp_per_level must be positive".to_string()));
        }
        if self.progression.max_level == 0 {
            return Err(GameError::Config("progression.max_level must be positive".to_string()));
        }
        if self.battle.critical_multiplier == 0 {
            return Err(GameError::Config("battle.critical_multiplier must be at least 1".to_string()));
        }
        if self.economy.sell_percent > 100 {
            return Err(GameError::Config("economy.sell_percent cannot exceed 100".to_string()));
        }
        Ok(())
    }
}
