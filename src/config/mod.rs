//! Configuration management for the Outpost server.
//!
//! All simulation tuning lives here so engines can be handed explicit config
//! structs instead of reading ambient globals; tests inject their own rate
//! tables the same way.
//!
//! Sections:
//!
//! - [`ServerConfig`] - tick driver and data locations
//! - [`HideoutConfig`] - resource flow rates and production tuning
//! - [`SkillsConfig`] - per-level skill bonus rates
//! - [`TradingConfig`] - trader/vendor identifiers and stash capacity
//! - [`LoggingConfig`] - log level and optional log file

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Main configuration structure, deserialized from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub hideout: HideoutConfig,
    pub skills: SkillsConfig,
    pub trading: TradingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Seconds between simulation ticks.
    pub tick_interval_secs: u64,
    /// Directory holding the sled profile store.
    pub data_dir: String,
    /// Directory holding catalog seed JSON files.
    pub seeds_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            data_dir: "data/store".to_string(),
            seeds_dir: "data/seeds".to_string(),
        }
    }
}

/// Resource flow rates and production tuning.
///
/// Drain rates are units per second; the defaults follow the measured
/// lifetimes of the consumables (one fuel unit per ~12.6 minutes, a 300-unit
/// air filter over ~17.6 hours, a 100-unit water filter over ~8.3 hours).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HideoutConfig {
    pub generator_fuel_flow_rate: f64,
    pub air_filter_flow_rate: f64,
    pub water_filter_flow_rate: f64,
    /// Multiplier applied to elapsed time for power-sensitive crafts while
    /// the generator is off.
    pub generator_speed_without_fuel: f64,
    /// Per-extra-GPU boost applied to the currency farm's craft time.
    pub gpu_boost_rate: f64,
    /// Extra currency output slots granted by elite Hideout Management.
    pub elite_slot_bonus: u32,
    /// Fallback output slot count when the recipe does not define one.
    pub default_currency_slots: u32,
}

impl Default for HideoutConfig {
    fn default() -> Self {
        Self {
            generator_fuel_flow_rate: 0.00131,
            air_filter_flow_rate: 0.004722,
            water_filter_flow_rate: 0.00333,
            generator_speed_without_fuel: 0.15,
            gpu_boost_rate: 0.041225,
            elite_slot_bonus: 2,
            default_currency_slots: 3,
        }
    }
}

/// Per-level skill bonus rates, in percent per level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Crafting: percent of production time removed per level.
    pub crafting_time_reduction_per_level: f64,
    /// Crafting: percent of consumable drain removed per level.
    pub crafting_consumption_reduction_per_level: f64,
    /// Hideout Management: percent of consumable drain removed per level.
    pub management_consumption_reduction_per_level: f64,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            crafting_time_reduction_per_level: 0.75,
            crafting_consumption_reduction_per_level: 0.25,
            management_consumption_reduction_per_level: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Trader id of the special NPC vendor that resells player items.
    pub vendor_trader_id: String,
    /// Item-count capacity of a fresh profile's stash.
    pub stash_capacity: usize,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            vendor_trader_id: "vendor_fence".to_string(),
            stash_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Cannot read config file '{}': {}", path, e))?;
        let config: Config =
            toml::from_str(&contents).map_err(|e| anyhow!("Invalid config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Write a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let contents = toml::to_string_pretty(&config)?;
        fs::write(path, contents).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.tick_interval_secs == 0 {
            return Err(anyhow!("server.tick_interval_secs must be positive"));
        }
        if self.server.data_dir.is_empty() {
            return Err(anyhow!("server.data_dir cannot be empty"));
        }
        for (name, rate) in [
            (
                "hideout.generator_fuel_flow_rate",
                self.hideout.generator_fuel_flow_rate,
            ),
            (
                "hideout.air_filter_flow_rate",
                self.hideout.air_filter_flow_rate,
            ),
            (
                "hideout.water_filter_flow_rate",
                self.hideout.water_filter_flow_rate,
            ),
        ] {
            if rate <= 0.0 {
                return Err(anyhow!("{} must be positive, got {}", name, rate));
            }
        }
        if !(0.0..=1.0).contains(&self.hideout.generator_speed_without_fuel) {
            return Err(anyhow!(
                "hideout.generator_speed_without_fuel must be within 0..=1"
            ));
        }
        if self.trading.vendor_trader_id.is_empty() {
            return Err(anyhow!("trading.vendor_trader_id cannot be empty"));
        }
        Ok(())
    }
}
