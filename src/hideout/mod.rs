//! Hideout simulation engine: production timers, resource decay, and the
//! skill bonus calculator.
//!
//! The engine is pull-based: nothing fires on a timer of its own. Each call
//! to [`production::update_player_hideout`] reconstructs everything that
//! should have happened from the wall-clock time elapsed since the profile's
//! last tick.

pub mod production;
pub mod resources;
pub mod skills;

pub use production::{
    adjusted_craft_time, collect_currency_output, compute_hideout_properties,
    currency_slot_count, start_production, update_player_hideout, update_production_timers,
    HideoutProperties, Production, ProductionKind, ToolRequest, MIN_CRAFT_TIME_SECONDS,
};
pub use resources::update_areas_with_resources;
pub use skills::{
    bonus_multiplier, consumption_multiplier, production_time_reduction, water_drain_multiplier,
};
