//! Production engine: crafting progress driven by elapsed wall-clock time.
//!
//! The server does not tick while a player is away; every pass re-derives
//! progress from the time elapsed since the profile's last simulation tick.
//! Each production carries a [`ProductionKind`] derived from its recipe's
//! area so the advance pass dispatches with an exhaustive match.

use serde::{Deserialize, Serialize};

use crate::catalog::{AreaType, Catalog, Recipe};
use crate::config::{HideoutConfig, SkillsConfig};
use crate::hideout::skills;
use crate::logutil::escape_log;
use crate::profile::{inventory, ItemRecord, Profile, SkillKind, SkillSet};
use crate::response::EventOutput;

/// No craft completes faster than this, whatever the skill bonuses say.
pub const MIN_CRAFT_TIME_SECONDS: f64 = 5.0;

/// Production categories with distinct advancement rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductionKind {
    /// Ordinary craft with a fixed duration and a hard progress clamp.
    Standard,
    /// Progress re-derived from the craft's own start timestamp each pass.
    ScavCase,
    /// Only advances while a filter is installed.
    WaterCollector,
    /// Continuous craft that keeps yielding output units while powered.
    CurrencyFarm,
    /// Ritual craft advanced by flat elapsed time, terminal once complete.
    CultistCircle,
}

impl ProductionKind {
    pub fn from_area(area_type: AreaType) -> Self {
        match area_type {
            AreaType::ScavCase => Self::ScavCase,
            AreaType::WaterCollector => Self::WaterCollector,
            AreaType::CurrencyFarm => Self::CurrencyFarm,
            AreaType::CultistCircle => Self::CultistCircle,
            _ => Self::Standard,
        }
    }
}

/// A single in-progress or completed craft instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Production {
    pub recipe_id: String,
    pub kind: ProductionKind,
    /// Accumulated seconds credited toward completion.
    pub progress: f64,
    /// Seconds required, already adjusted for this profile's skills.
    pub production_time: f64,
    pub start_timestamp: i64,
    pub in_progress: bool,
    pub available_for_finish: bool,
    /// Output items accumulated so far (continuous crafts).
    pub products: Vec<ItemRecord>,
    /// Craft only advances while the generator is powered.
    pub needs_fuel_for_all_production_time: bool,
    /// Tools consumed at start, returned to the inventory on completion.
    pub required_tools: Vec<ItemRecord>,
}

impl Production {
    pub fn new(recipe: &Recipe, production_time: f64, now: i64) -> Self {
        Self {
            recipe_id: recipe.id.clone(),
            kind: ProductionKind::from_area(recipe.area_type),
            progress: 0.0,
            production_time,
            start_timestamp: now,
            in_progress: true,
            available_for_finish: false,
            products: Vec::new(),
            needs_fuel_for_all_production_time: recipe.needs_fuel_for_all_production_time,
            required_tools: Vec::new(),
        }
    }

    /// Whether this craft has nothing left to simulate. Continuous and
    /// cultist-circle crafts are never "complete" in this sense; they have
    /// their own terminal handling.
    pub fn is_complete(&self) -> bool {
        matches!(
            self.kind,
            ProductionKind::Standard | ProductionKind::ScavCase | ProductionKind::WaterCollector
        ) && self.production_time > 0.0
            && self.progress >= self.production_time
    }

    /// Terminal state: done, collectible, progress conventionally reset to 0.
    fn flag_available_for_finish(&mut self) {
        self.available_for_finish = true;
        self.progress = 0.0;
        self.in_progress = false;
    }
}

/// Transient snapshot of hideout facts needed by every per-area update,
/// computed once per simulation tick.
#[derive(Debug, Clone, Copy)]
pub struct HideoutProperties {
    pub generator_on: bool,
    pub water_collector_has_filter: bool,
    pub gpu_count: u32,
}

/// Derive the per-tick hideout properties from profile state.
pub fn compute_hideout_properties(profile: &Profile) -> HideoutProperties {
    let generator_on = profile
        .hideout
        .area(AreaType::Generator)
        .map(|area| area.active)
        .unwrap_or(false);

    let gpu_count = profile
        .hideout
        .area(AreaType::CurrencyFarm)
        .map(|area| area.filled_slot_count() as u32)
        .unwrap_or(0);

    let water_collector_has_filter = profile
        .hideout
        .area(AreaType::WaterCollector)
        // Filters can only be slotted from area level 3
        .map(|area| area.level == 3 && area.filled_slot_count() > 0)
        .unwrap_or(false);

    HideoutProperties {
        generator_on,
        water_collector_has_filter,
        gpu_count,
    }
}

/// A tool handed over when starting a craft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    pub item_id: String,
    pub count: u32,
}

/// Craft time with skill adjustments applied.
///
/// Crafting reduces every recipe except the continuous currency generator;
/// Hideout Management additionally applies when `apply_management_bonus` is
/// set (power-sensitive recipes, and the water collector's per-tick
/// recomputation).
pub fn adjusted_craft_time(
    player_skills: &SkillSet,
    recipe: &Recipe,
    skills_config: &SkillsConfig,
    apply_management_bonus: bool,
) -> f64 {
    let mut reduction_seconds = 0.0;

    if recipe.area_type != AreaType::CurrencyFarm {
        reduction_seconds += skills::production_time_reduction(
            recipe.production_time,
            player_skills.progress(SkillKind::Crafting),
            skills_config.crafting_time_reduction_per_level,
        );
    }

    if apply_management_bonus {
        reduction_seconds += skills::production_time_reduction(
            recipe.production_time,
            player_skills.progress(SkillKind::HideoutManagement),
            skills_config.management_consumption_reduction_per_level,
        );
    }

    (recipe.production_time - reduction_seconds).max(MIN_CRAFT_TIME_SECONDS)
}

/// Start a craft for a profile.
///
/// A missing recipe is logged and surfaced as a warning on the output; the
/// profile is left untouched. A successful start overwrites any stale
/// production under the same recipe key.
pub fn start_production(
    profile: &mut Profile,
    recipe_id: &str,
    tools: &[ToolRequest],
    catalog: &Catalog,
    skills_config: &SkillsConfig,
    output: &mut EventOutput,
    now: i64,
) {
    let Some(recipe) = catalog.recipe(recipe_id) else {
        log::error!(
            "Cannot start production, recipe {} missing from catalog",
            escape_log(recipe_id)
        );
        output.push_warning(format!("Unknown recipe: {recipe_id}"));
        return;
    };

    let production_time = adjusted_craft_time(
        &profile.skills,
        recipe,
        skills_config,
        recipe.needs_fuel_for_all_production_time,
    );
    let mut production = Production::new(recipe, production_time, now);

    // Snapshot handed-over tools so completion can return exactly what was taken
    for tool in tools {
        match inventory::find_item(&profile.inventory.items, &tool.item_id) {
            Some(found) => {
                let mut snapshot = found.clone();
                snapshot.id = uuid::Uuid::new_v4().to_string();
                snapshot.parent_id = None;
                snapshot.slot_id = None;
                snapshot.ensure_upd().stack_count = tool.count;
                production.required_tools.push(snapshot);
            }
            None => {
                log::warn!(
                    "Tool {} for recipe {} not found in inventory, skipping snapshot",
                    escape_log(&tool.item_id),
                    escape_log(recipe_id)
                );
                output.push_warning(format!("Tool not found: {}", tool.item_id));
            }
        }
    }

    profile
        .hideout
        .production
        .insert(recipe.id.clone(), Some(production));
}

/// Output slot capacity of the currency farm for this profile.
pub fn currency_slot_count(
    profile: &Profile,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
) -> u32 {
    let base = catalog
        .currency_recipe()
        .and_then(|recipe| recipe.production_limit_count)
        .unwrap_or(hideout_config.default_currency_slots);

    if profile.skills.is_elite(SkillKind::HideoutManagement) {
        base + hideout_config.elite_slot_bonus
    } else {
        base
    }
}

/// Seconds of simulated time since the profile's last tick.
///
/// Crafts in areas that do not need fuel run at full speed regardless of the
/// generator; everything else is slowed to the configured fraction while the
/// generator is off.
fn elapsed_seconds(
    last_tick: i64,
    now: i64,
    generator_on: bool,
    recipe: Option<&Recipe>,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
) -> f64 {
    let elapsed = (now - last_tick).max(0) as f64;

    if let Some(recipe) = recipe {
        if let Some(area) = catalog.area(recipe.area_type) {
            if !area.needs_fuel {
                return elapsed;
            }
        }
    }

    if generator_on {
        elapsed
    } else {
        elapsed * hideout_config.generator_speed_without_fuel
    }
}

/// Advance every production on a profile and drain area resources, then
/// stamp the profile with `now` as its last simulation tick.
pub fn update_player_hideout(
    profile: &mut Profile,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
    skills_config: &SkillsConfig,
    output: &mut EventOutput,
    now: i64,
) {
    if profile.hideout.last_tick_timestamp.is_none() {
        profile.hideout.last_tick_timestamp = Some(now);
    }

    let properties = compute_hideout_properties(profile);

    super::resources::update_areas_with_resources(
        profile,
        catalog,
        hideout_config,
        skills_config,
        &properties,
        output,
        now,
    );
    update_production_timers(profile, catalog, hideout_config, &properties, now);

    profile.hideout.last_tick_timestamp = Some(now);
}

/// Advance all productions by kind. Malformed (`None`) entries are collected
/// during iteration and removed afterwards so the map is never mutated while
/// being walked.
pub fn update_production_timers(
    profile: &mut Profile,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
    properties: &HideoutProperties,
    now: i64,
) {
    let last_tick = profile.hideout.last_tick_timestamp.unwrap_or(now);
    let currency_slots = currency_slot_count(profile, catalog, hideout_config);

    let mut stale_keys: Vec<String> = Vec::new();
    let keys: Vec<String> = profile.hideout.production.keys().cloned().collect();

    for key in keys {
        let Some(entry) = profile.hideout.production.get_mut(&key) else {
            continue;
        };
        let Some(craft) = entry.as_mut() else {
            // Cancelled craft left a null entry behind, get rid of it
            stale_keys.push(key);
            continue;
        };

        if craft.is_complete() {
            continue;
        }

        match craft.kind {
            ProductionKind::ScavCase => {
                // Re-derive from the wall clock rather than accumulating
                // deltas; self-corrects for missed ticks
                let elapsed = (now - craft.start_timestamp) as f64 - craft.progress;
                craft.progress += elapsed;
            }
            ProductionKind::WaterCollector => {
                let recipe = catalog.recipe(&craft.recipe_id);
                let elapsed = elapsed_seconds(
                    last_tick,
                    now,
                    properties.generator_on,
                    recipe,
                    catalog,
                    hideout_config,
                );
                if properties.water_collector_has_filter {
                    craft.progress += elapsed;
                }
            }
            ProductionKind::CurrencyFarm => {
                update_currency_farm(
                    craft,
                    currency_slots,
                    properties,
                    catalog,
                    hideout_config,
                    last_tick,
                    now,
                );
            }
            ProductionKind::CultistCircle => {
                update_cultist_circle(craft, last_tick, now);
            }
            ProductionKind::Standard => {
                let Some(recipe) = catalog.recipe(&craft.recipe_id) else {
                    log::error!(
                        "Recipe {} missing from catalog, skipping production update",
                        escape_log(&craft.recipe_id)
                    );
                    continue;
                };

                let elapsed = elapsed_seconds(
                    last_tick,
                    now,
                    properties.generator_on,
                    Some(recipe),
                    catalog,
                    hideout_config,
                );

                if craft.needs_fuel_for_all_production_time {
                    if properties.generator_on {
                        craft.progress += elapsed;
                    }
                } else {
                    craft.progress += elapsed;
                }

                if !recipe.continuous {
                    // Hard cap, continuous crafts are clamped by their own branch
                    craft.progress = craft.progress.min(craft.production_time);
                }
            }
        }
    }

    for key in stale_keys {
        profile.hideout.production.remove(&key);
        log::warn!("Removed malformed production entry {}", escape_log(&key));
    }
}

/// Advance the continuous currency generator.
///
/// Needs generator power to run at all. Extra GPUs shorten the effective
/// craft time; progress still accrues against the base duration so the boost
/// is applied exactly once.
fn update_currency_farm(
    craft: &mut Production,
    slot_capacity: u32,
    properties: &HideoutProperties,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
    last_tick: i64,
    now: i64,
) {
    if !properties.generator_on {
        return;
    }

    if craft.products.len() as u32 >= slot_capacity {
        // Output storage full, halt accrual until collection frees space
        craft.progress = 0.0;
        return;
    }

    let Some(recipe) = catalog.currency_recipe() else {
        log::error!("Currency recipe missing from catalog, farm not advanced");
        return;
    };

    if properties.gpu_count == 0 {
        // No installed hardware, no hash rate
        return;
    }

    let adjusted_time = recipe.production_time
        / (1.0 + (properties.gpu_count as f64 - 1.0) * hideout_config.gpu_boost_rate);
    let time_multiplier = recipe.production_time / adjusted_time;
    let elapsed = (now - last_tick).max(0) as f64;

    craft.progress += (elapsed * time_multiplier).floor();

    while craft.progress >= recipe.production_time {
        if (craft.products.len() as u32) < slot_capacity {
            craft.products.push(ItemRecord::new(&recipe.end_product));
            craft.progress -= recipe.production_time;
        } else {
            craft.progress = 0.0;
        }
    }

    craft.start_timestamp = now;
}

/// Advance a cultist-circle craft: flat elapsed time, no skill or power
/// adjustment, terminal once complete.
fn update_cultist_circle(craft: &mut Production, last_tick: i64, now: i64) {
    if craft.available_for_finish && !craft.in_progress {
        return;
    }

    let elapsed = (now - last_tick).max(0) as f64;

    if craft.progress < craft.production_time {
        craft.progress += elapsed;
        if craft.progress >= craft.production_time {
            craft.flag_available_for_finish();
        }
        return;
    }

    craft.flag_available_for_finish();
}

/// Collect accumulated currency-farm output into the stash.
///
/// Delivery warnings abort the collection (products stay put). When the farm
/// was at full capacity its start timestamp resets so accrual restarts from
/// now. Output can only be collected in full.
pub fn collect_currency_output(
    profile: &mut Profile,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
    output: &mut EventOutput,
    now: i64,
) {
    let slot_capacity = currency_slot_count(profile, catalog, hideout_config);

    let Some(recipe) = catalog.currency_recipe() else {
        log::error!("Currency recipe missing from catalog, nothing to collect");
        output.push_warning("No currency output to collect");
        return;
    };

    let (stacks, product_count) = {
        let Some(Some(craft)) = profile.hideout.production.get(&recipe.id) else {
            log::error!("No currency production on profile {}", profile.id);
            output.push_warning("No currency output to collect");
            return;
        };
        if craft.products.is_empty() {
            output.push_warning("No currency output to collect");
            return;
        }

        let stacks: Vec<Vec<ItemRecord>> = craft
            .products
            .iter()
            .map(|product| {
                let mut item = product.clone();
                item.id = uuid::Uuid::new_v4().to_string();
                vec![item]
            })
            .collect();
        (stacks, craft.products.len() as u32)
    };

    inventory::add_items_to_stash(&mut profile.inventory, stacks, true, catalog, output);
    if output.has_warnings() {
        return;
    }

    if let Some(Some(craft)) = profile.hideout.production.get_mut(&recipe.id) {
        if product_count >= slot_capacity {
            // Accrual was halted at capacity; restart the clock from collection
            craft.start_timestamp = now;
        }
        craft.products.clear();
    }
}
