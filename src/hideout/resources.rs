//! Resource-bearing hideout areas: generator fuel, air filters, and the
//! water collector's filters.
//!
//! Exactly one slot per area is actively drained at a time, in slot order.
//! A depleted slot is cleared and the overflow carries into the next
//! populated slot. Every whole 10 units consumed awards one Hideout
//! Management skill point, remainder retained.

use crate::catalog::{AreaType, Catalog};
use crate::config::{HideoutConfig, SkillsConfig};
use crate::hideout::production::{adjusted_craft_time, HideoutProperties, Production};
use crate::hideout::skills;
use crate::profile::{
    BonusType, HideoutArea, HideoutState, ItemRecord, ItemResource, ItemUpd, Profile, SkillKind,
    SkillSet,
};
use crate::response::EventOutput;

/// Round to 4 decimal places to keep drain accuracy across many small ticks.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Round to 3 decimal places (water filter precision).
fn round3(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}

/// Award one Hideout Management point per whole 10 units consumed, keeping
/// the remainder on the counter.
fn award_management_points(player_skills: &mut SkillSet, points_consumed: &mut f64, now: i64) {
    while *points_consumed >= 10.0 {
        player_skills.add_points(SkillKind::HideoutManagement, 1.0, now);
        *points_consumed -= 10.0;
    }
}

/// Rebuild an item's upd as a single-stack resource carrier, preserving its
/// found-in-raid flag.
fn set_resource_state(item: &mut ItemRecord, value: f64, units_consumed: f64) {
    let found_in_raid = item.is_found_in_raid();
    item.upd = Some(ItemUpd {
        stack_count: 1,
        spawned_in_session: found_in_raid,
        resource: Some(ItemResource {
            value: Some(value),
            units_consumed,
        }),
        buy_restriction_max: None,
    });
}

/// Iterate resource-bearing areas and apply elapsed-time drains.
pub fn update_areas_with_resources(
    profile: &mut Profile,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
    skills_config: &SkillsConfig,
    properties: &HideoutProperties,
    output: &mut EventOutput,
    now: i64,
) {
    let fuel_penalty_sum = profile.bonus_value_sum(BonusType::FuelConsumption);
    let last_tick = profile.hideout.last_tick_timestamp.unwrap_or(now);
    let elapsed = (now - last_tick).max(0) as f64;
    let profile_id = profile.id.clone();

    let HideoutState {
        areas, production, ..
    } = &mut profile.hideout;
    let player_skills = &mut profile.skills;

    for area in areas.iter_mut() {
        match area.area_type {
            AreaType::Generator if properties.generator_on => {
                update_fuel(
                    area,
                    player_skills,
                    fuel_penalty_sum,
                    catalog,
                    hideout_config,
                    skills_config,
                    elapsed,
                    &profile_id,
                    now,
                );
            }
            AreaType::WaterCollector => {
                update_water_collector(
                    area,
                    production,
                    player_skills,
                    catalog,
                    hideout_config,
                    skills_config,
                    properties,
                    output,
                    elapsed,
                    now,
                );
            }
            AreaType::AirFilteringUnit if properties.generator_on => {
                update_air_filters(
                    area,
                    player_skills,
                    catalog,
                    hideout_config,
                    skills_config,
                    elapsed,
                    now,
                );
            }
            _ => {}
        }
    }
}

/// Drain generator fuel. When every slot runs dry the generator is flagged
/// inactive; dependent systems see the outage on the next tick.
#[allow(clippy::too_many_arguments)]
fn update_fuel(
    area: &mut HideoutArea,
    player_skills: &mut SkillSet,
    fuel_penalty_sum: f64,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
    skills_config: &SkillsConfig,
    elapsed: f64,
    profile_id: &str,
    now: i64,
) {
    let mut drain = hideout_config.generator_fuel_flow_rate * elapsed;

    // Consumption-increasing bonuses are stored sign-flipped on the profile
    let penalty_rate = -(fuel_penalty_sum / 100.0);
    let management_rate = skills::bonus_multiplier(
        player_skills.progress(SkillKind::HideoutManagement),
        skills_config.management_consumption_reduction_per_level,
    );
    drain *= skills::consumption_multiplier(penalty_rate, management_rate);

    let mut has_fuel_remaining = false;

    for (index, slot) in area.slots.iter_mut().enumerate() {
        let Some(item) = slot.item.as_mut() else {
            continue;
        };

        let resource = item.upd.as_ref().and_then(|upd| upd.resource.clone());
        let stored_value = resource.as_ref().and_then(|r| r.value);
        if matches!(stored_value, Some(v) if v <= 0.0) {
            continue;
        }

        let (mut remaining, mut consumed) = match stored_value {
            Some(value) => (
                value - drain,
                resource.map(|r| r.units_consumed).unwrap_or(0.0) + drain,
            ),
            None => {
                // Fresh item, look up its full capacity
                let Some(template) = catalog.item(&item.tpl) else {
                    log::warn!("Fuel item template {} missing from catalog", item.tpl);
                    continue;
                };
                (template.max_resource.unwrap_or(0.0) - drain, drain)
            }
        };

        remaining = round4(remaining);
        consumed = round4(consumed);
        award_management_points(player_skills, &mut consumed, now);

        if remaining > 0.0 {
            set_resource_state(item, remaining, consumed);
            log::debug!(
                "Profile {} generator has {} fuel left in slot {}",
                profile_id,
                remaining,
                index + 1
            );
            has_fuel_remaining = true;
            break;
        }

        // Tank ran dry; clear the slot and carry the overflow into the next one
        slot.item = None;
        drain = remaining.abs();
        log::debug!("Profile {} generator drained slot {}", profile_id, index + 1);
    }

    if !has_fuel_remaining {
        area.active = false;
        log::debug!("Profile {} generator ran out of fuel", profile_id);
    }
}

/// Drain air filters while the generator is powered. Same slot-chaining rules
/// as fuel, without the power-off side effect.
fn update_air_filters(
    area: &mut HideoutArea,
    player_skills: &mut SkillSet,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
    skills_config: &SkillsConfig,
    elapsed: f64,
    now: i64,
) {
    let management_rate = skills::bonus_multiplier(
        player_skills.progress(SkillKind::HideoutManagement),
        skills_config.management_consumption_reduction_per_level,
    );
    let mut drain =
        hideout_config.air_filter_flow_rate * elapsed * (1.0 - management_rate).max(0.0);

    for (index, slot) in area.slots.iter_mut().enumerate() {
        let Some(item) = slot.item.as_mut() else {
            continue;
        };

        let resource = item.upd.as_ref().and_then(|upd| upd.resource.clone());
        let stored_value = resource.as_ref().and_then(|r| r.value);
        if matches!(stored_value, Some(v) if v <= 0.0) {
            continue;
        }

        let (mut remaining, mut consumed) = match stored_value {
            Some(value) => (
                value - drain,
                resource.map(|r| r.units_consumed).unwrap_or(0.0) + drain,
            ),
            None => {
                let Some(template) = catalog.item(&item.tpl) else {
                    log::warn!("Air filter template {} missing from catalog", item.tpl);
                    continue;
                };
                (template.max_resource.unwrap_or(0.0) - drain, drain)
            }
        };

        remaining = round4(remaining);
        consumed = round4(consumed);
        award_management_points(player_skills, &mut consumed, now);

        if remaining > 0.0 {
            set_resource_state(item, remaining, consumed);
            log::debug!("Air filter has {} units left in slot {}", remaining, index + 1);
            break;
        }

        slot.item = None;
        drain = remaining.abs();
    }
}

/// Water collector upkeep: recompute the craft's skill-adjusted time, drain
/// the installed filter, and auto-start the purified-water craft when a
/// filter is present but no craft exists.
#[allow(clippy::too_many_arguments)]
fn update_water_collector(
    area: &mut HideoutArea,
    production: &mut std::collections::HashMap<String, Option<Production>>,
    player_skills: &mut SkillSet,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
    skills_config: &SkillsConfig,
    properties: &HideoutProperties,
    output: &mut EventOutput,
    elapsed: f64,
    now: i64,
) {
    // Cannot collect or hold filters below level 3
    if area.level != 3 {
        return;
    }
    if !properties.water_collector_has_filter {
        return;
    }

    let Some(recipe) = catalog.water_recipe() else {
        log::error!("Water collector recipe missing from catalog");
        output.push_warning("Water collector recipe unavailable");
        return;
    };

    if let Some(Some(craft)) = production.get_mut(&recipe.id) {
        // Keep craft time in sync with skill gains since the craft began
        craft.production_time = adjusted_craft_time(player_skills, recipe, skills_config, true);
        update_water_filters(
            area,
            craft,
            player_skills,
            catalog,
            hideout_config,
            skills_config,
            recipe.production_time,
            properties.generator_on,
            elapsed,
            now,
        );
        return;
    }

    // Filter installed but no craft running (or a stale null entry); start
    // one so the filter has something to feed
    let production_time = adjusted_craft_time(player_skills, recipe, skills_config, true);
    production.insert(
        recipe.id.clone(),
        Some(Production::new(recipe, production_time, now)),
    );
}

/// Drain the installed water filter while the purified-water craft runs.
#[allow(clippy::too_many_arguments)]
fn update_water_filters(
    area: &mut HideoutArea,
    craft: &mut Production,
    player_skills: &mut SkillSet,
    catalog: &Catalog,
    hideout_config: &HideoutConfig,
    skills_config: &SkillsConfig,
    base_production_time: f64,
    generator_on: bool,
    elapsed: f64,
    now: i64,
) {
    let management_rate = skills::bonus_multiplier(
        player_skills.progress(SkillKind::HideoutManagement),
        skills_config.management_consumption_reduction_per_level,
    );
    let crafting_rate = skills::bonus_multiplier(
        player_skills.progress(SkillKind::Crafting),
        skills_config.crafting_consumption_reduction_per_level,
    );
    let per_second = hideout_config.water_filter_flow_rate
        * skills::water_drain_multiplier(management_rate, crafting_rate);

    let elapsed = if generator_on {
        elapsed
    } else {
        elapsed * hideout_config.generator_speed_without_fuel
    };

    // When more wall-clock passed than the craft needs, only drain for the
    // seconds the craft actually ran
    let drain_seconds = if elapsed > base_production_time {
        (base_production_time - craft.progress).max(0.0)
    } else {
        elapsed
    };
    let mut drain = per_second * drain_seconds;

    if craft.progress > craft.production_time {
        // Craft is complete, filters stop draining
        return;
    }

    for (index, slot) in area.slots.iter_mut().enumerate() {
        let Some(item) = slot.item.as_mut() else {
            continue;
        };

        let resource = item.upd.as_ref().and_then(|upd| upd.resource.clone());
        let stored_value = resource.as_ref().and_then(|r| r.value);

        let (mut remaining, mut consumed) = match stored_value {
            Some(value) => (
                value - drain,
                resource.map(|r| r.units_consumed).unwrap_or(0.0) + drain,
            ),
            None => {
                let Some(template) = catalog.item(&item.tpl) else {
                    log::warn!("Water filter template {} missing from catalog", item.tpl);
                    continue;
                };
                (template.max_resource.unwrap_or(0.0) - drain, drain)
            }
        };

        remaining = round3(remaining);
        consumed = round3(consumed);
        award_management_points(player_skills, &mut consumed, now);

        if remaining > 0.0 {
            set_resource_state(item, remaining, consumed);
            log::debug!(
                "Water filter has {} units left in slot {}",
                remaining,
                index + 1
            );
            break;
        }

        slot.item = None;
        drain = remaining.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemKind, ItemTemplate};
    use crate::profile::AreaSlot;

    fn fuel_catalog() -> Catalog {
        Catalog::empty().with_item(ItemTemplate {
            id: "tpl_fuel_tank".to_string(),
            name: "Fuel".to_string(),
            kind: ItemKind::Fuel,
            max_stack_size: 1,
            max_resource: Some(60.0),
        })
    }

    fn fuel_item(remaining: Option<f64>, consumed: f64) -> ItemRecord {
        let mut item = ItemRecord::new("tpl_fuel_tank");
        if remaining.is_some() {
            item.ensure_upd().resource = Some(ItemResource {
                value: remaining,
                units_consumed: consumed,
            });
        } else {
            item.ensure_upd().resource = None;
        }
        item
    }

    fn generator(slots: Vec<Option<ItemRecord>>) -> HideoutArea {
        let mut area = HideoutArea::new(AreaType::Generator, 1, slots.len());
        area.active = true;
        for (slot, item) in area.slots.iter_mut().zip(slots) {
            *slot = AreaSlot { item };
        }
        area
    }

    #[test]
    fn overflow_chains_into_next_slot() {
        // Two slots {3, 10}, drain 5 -> slot 1 cleared, slot 2 at 8
        let catalog = fuel_catalog();
        let mut area = generator(vec![
            Some(fuel_item(Some(3.0), 0.0)),
            Some(fuel_item(Some(10.0), 0.0)),
        ]);
        let mut player_skills = SkillSet::default();

        let config = HideoutConfig {
            generator_fuel_flow_rate: 1.0,
            ..Default::default()
        };
        update_fuel(
            &mut area,
            &mut player_skills,
            0.0,
            &catalog,
            &config,
            &SkillsConfig::default(),
            5.0,
            "p1",
            1,
        );

        assert!(area.slots[0].item.is_none());
        let second = area.slots[1].item.as_ref().expect("slot 2 kept its item");
        let value = second
            .upd
            .as_ref()
            .and_then(|u| u.resource.as_ref())
            .and_then(|r| r.value);
        assert_eq!(value, Some(8.0));
        assert!(area.active);
    }

    #[test]
    fn exhausted_generator_flagged_inactive() {
        let catalog = fuel_catalog();
        let mut area = generator(vec![Some(fuel_item(Some(2.0), 0.0))]);
        let mut player_skills = SkillSet::default();

        let config = HideoutConfig {
            generator_fuel_flow_rate: 1.0,
            ..Default::default()
        };
        update_fuel(
            &mut area,
            &mut player_skills,
            0.0,
            &catalog,
            &config,
            &SkillsConfig::default(),
            5.0,
            "p1",
            1,
        );

        assert!(area.slots[0].item.is_none());
        assert!(!area.active);
    }

    #[test]
    fn fresh_item_uses_catalog_capacity() {
        let catalog = fuel_catalog();
        let mut area = generator(vec![Some(fuel_item(None, 0.0))]);
        let mut player_skills = SkillSet::default();

        let config = HideoutConfig {
            generator_fuel_flow_rate: 0.5,
            ..Default::default()
        };
        update_fuel(
            &mut area,
            &mut player_skills,
            0.0,
            &catalog,
            &config,
            &SkillsConfig::default(),
            4.0,
            "p1",
            1,
        );

        let item = area.slots[0].item.as_ref().expect("item kept");
        let resource = item
            .upd
            .as_ref()
            .and_then(|u| u.resource.as_ref())
            .expect("resource set");
        assert_eq!(resource.value, Some(58.0));
        assert_eq!(resource.units_consumed, 2.0);
    }

    #[test]
    fn every_ten_units_awards_a_skill_point() {
        let mut player_skills = SkillSet::default();
        let mut consumed = 23.0;
        award_management_points(&mut player_skills, &mut consumed, 1);

        assert_eq!(player_skills.progress(SkillKind::HideoutManagement), 2.0);
        assert!((consumed - 3.0).abs() < 1e-9);
    }

    #[test]
    fn combined_penalty_never_refunds_fuel() {
        let catalog = fuel_catalog();
        let mut area = generator(vec![Some(fuel_item(Some(50.0), 0.0))]);
        let mut player_skills = SkillSet::default();
        // Elite management reduction plus a large negative penalty would push
        // the multiplier below zero without the floor
        player_skills.add_points(SkillKind::HideoutManagement, 5100.0, 1);

        let config = HideoutConfig {
            generator_fuel_flow_rate: 1.0,
            ..Default::default()
        };
        let skills_config = SkillsConfig {
            management_consumption_reduction_per_level: 3.0,
            ..Default::default()
        };
        update_fuel(
            &mut area,
            &mut player_skills,
            0.0,
            &catalog,
            &config,
            &skills_config,
            10.0,
            "p1",
            1,
        );

        let value = area.slots[0]
            .item
            .as_ref()
            .and_then(|i| i.upd.as_ref())
            .and_then(|u| u.resource.as_ref())
            .and_then(|r| r.value)
            .expect("resource value");
        // Multiplier floored at 0: nothing drained, nothing refunded
        assert_eq!(value, 50.0);
    }
}
