//! Integration tests for the hideout production engine: elapsed-time
//! advancement, power gating, continuous output, and self-healing passes.

use outpost::catalog::{AreaDefinition, AreaType, Catalog, ItemKind, ItemTemplate, Recipe};
use outpost::config::{HideoutConfig, SkillsConfig};
use outpost::hideout::{
    collect_currency_output, start_production, update_player_hideout, Production, ProductionKind,
};
use outpost::profile::{AreaSlot, HideoutArea, ItemRecord, ItemResource, Profile, SkillKind};
use outpost::response::EventOutput;

fn item_template(id: &str, kind: ItemKind, max_resource: Option<f64>) -> ItemTemplate {
    ItemTemplate {
        id: id.to_string(),
        name: id.to_string(),
        kind,
        max_stack_size: 1,
        max_resource,
    }
}

fn standard_recipe(id: &str, production_time: f64, power_sensitive: bool) -> Recipe {
    Recipe {
        id: id.to_string(),
        area_type: AreaType::Workbench,
        production_time,
        end_product: "tpl_out".to_string(),
        count: 1,
        continuous: false,
        needs_fuel_for_all_production_time: power_sensitive,
        production_limit_count: None,
    }
}

fn currency_recipe(production_time: f64, slots: u32) -> Recipe {
    Recipe {
        id: "recipe_coin_mint".to_string(),
        area_type: AreaType::CurrencyFarm,
        production_time,
        end_product: "tpl_crypto_coin".to_string(),
        count: 1,
        continuous: true,
        needs_fuel_for_all_production_time: true,
        production_limit_count: Some(slots),
    }
}

fn base_catalog() -> Catalog {
    Catalog::empty()
        .with_item(item_template("tpl_fuel_tank", ItemKind::Fuel, Some(60.0)))
        .with_item(item_template("tpl_crypto_coin", ItemKind::Barter, None))
        .with_item(item_template("tpl_out", ItemKind::Barter, None))
        .with_area(AreaDefinition {
            area_type: AreaType::Generator,
            needs_fuel: false,
        })
        .with_area(AreaDefinition {
            area_type: AreaType::Workbench,
            needs_fuel: true,
        })
        .with_area(AreaDefinition {
            area_type: AreaType::CurrencyFarm,
            needs_fuel: true,
        })
        .with_area(AreaDefinition {
            area_type: AreaType::ScavCase,
            needs_fuel: false,
        })
}

fn fueled_generator() -> HideoutArea {
    let mut area = HideoutArea::new(AreaType::Generator, 3, 1);
    area.active = true;
    let mut fuel = ItemRecord::new("tpl_fuel_tank");
    fuel.ensure_upd().resource = Some(ItemResource {
        value: Some(60.0),
        units_consumed: 0.0,
    });
    area.slots[0] = AreaSlot { item: Some(fuel) };
    area
}

fn profile_with_generator() -> Profile {
    let mut profile = Profile::new("p1", "standard");
    profile.hideout.areas.push(fueled_generator());
    profile
}

fn tick(profile: &mut Profile, catalog: &Catalog, now: i64) {
    let mut output = EventOutput::new();
    update_player_hideout(
        profile,
        catalog,
        &HideoutConfig::default(),
        &SkillsConfig::default(),
        &mut output,
        now,
    );
}

fn progress_of(profile: &Profile, recipe_id: &str) -> f64 {
    profile
        .hideout
        .production
        .get(recipe_id)
        .and_then(|entry| entry.as_ref())
        .map(|craft| craft.progress)
        .expect("production exists")
}

#[test]
fn standard_recipe_advances_then_clamps() {
    let catalog = base_catalog().with_recipe(standard_recipe("r1", 100.0, true));
    let mut profile = profile_with_generator();

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "r1",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        1000,
    );
    assert!(!output.has_warnings());
    profile.hideout.last_tick_timestamp = Some(1000);

    // 40 seconds elapsed with the generator on
    tick(&mut profile, &catalog, 1040);
    assert_eq!(progress_of(&profile, "r1"), 40.0);

    // 70 more seconds: clamped at the production time, not 110
    tick(&mut profile, &catalog, 1110);
    assert_eq!(progress_of(&profile, "r1"), 100.0);
}

#[test]
fn power_sensitive_recipe_freezes_without_generator() {
    let catalog = base_catalog().with_recipe(standard_recipe("r1", 100.0, true));
    let mut profile = Profile::new("p1", "standard");
    // Generator present but unpowered
    profile
        .hideout
        .areas
        .push(HideoutArea::new(AreaType::Generator, 3, 1));

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "r1",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);

    tick(&mut profile, &catalog, 50);
    assert_eq!(progress_of(&profile, "r1"), 0.0);
}

#[test]
fn power_insensitive_recipe_runs_slower_unpowered() {
    let catalog = base_catalog().with_recipe(standard_recipe("r1", 1000.0, false));
    let mut profile = Profile::new("p1", "standard");
    profile
        .hideout
        .areas
        .push(HideoutArea::new(AreaType::Generator, 3, 1));

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "r1",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);

    // 100s elapsed at the default 0.15 unpowered rate
    tick(&mut profile, &catalog, 100);
    assert!((progress_of(&profile, "r1") - 15.0).abs() < 1e-9);
}

#[test]
fn scav_case_rederives_progress_from_wall_clock() {
    let scav_recipe = Recipe {
        id: "r_scav".to_string(),
        area_type: AreaType::ScavCase,
        production_time: 500.0,
        end_product: "tpl_out".to_string(),
        count: 1,
        continuous: false,
        needs_fuel_for_all_production_time: false,
        production_limit_count: None,
    };
    let catalog = base_catalog().with_recipe(scav_recipe);
    let mut profile = profile_with_generator();

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "r_scav",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        1000,
    );
    profile.hideout.last_tick_timestamp = Some(1000);

    // Even with a missed tick, progress tracks the wall clock exactly
    tick(&mut profile, &catalog, 1300);
    assert_eq!(progress_of(&profile, "r_scav"), 300.0);

    tick(&mut profile, &catalog, 1450);
    assert_eq!(progress_of(&profile, "r_scav"), 450.0);
}

#[test]
fn currency_farm_yields_unit_and_carries_remainder() {
    let catalog = base_catalog().with_recipe(currency_recipe(100.0, 3));
    let mut profile = profile_with_generator();
    let mut farm = HideoutArea::new(AreaType::CurrencyFarm, 1, 10);
    // One GPU: no boost, time multiplier 1
    farm.slots[0].item = Some(ItemRecord::new("tpl_graphics_card"));
    profile.hideout.areas.push(farm);

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "recipe_coin_mint",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);

    // Exactly one adjusted duration plus 25 seconds
    tick(&mut profile, &catalog, 125);

    let craft = profile
        .hideout
        .production
        .get("recipe_coin_mint")
        .and_then(|entry| entry.as_ref())
        .expect("farm craft");
    assert_eq!(craft.products.len(), 1);
    assert_eq!(craft.progress, 25.0);
    // Start timestamp resets after each farm adjustment
    assert_eq!(craft.start_timestamp, 125);
}

#[test]
fn currency_farm_halts_when_storage_full() {
    let catalog = base_catalog().with_recipe(currency_recipe(100.0, 2));
    let mut profile = profile_with_generator();
    let mut farm = HideoutArea::new(AreaType::CurrencyFarm, 1, 10);
    farm.slots[0].item = Some(ItemRecord::new("tpl_graphics_card"));
    profile.hideout.areas.push(farm);

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "recipe_coin_mint",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);

    // Enough time for 5 units, capacity is 2
    tick(&mut profile, &catalog, 500);

    let craft = profile
        .hideout
        .production
        .get("recipe_coin_mint")
        .and_then(|entry| entry.as_ref())
        .expect("farm craft");
    assert_eq!(craft.products.len(), 2);
    assert_eq!(craft.progress, 0.0);
}

#[test]
fn currency_farm_needs_power() {
    let catalog = base_catalog().with_recipe(currency_recipe(100.0, 3));
    let mut profile = Profile::new("p1", "standard");
    profile
        .hideout
        .areas
        .push(HideoutArea::new(AreaType::Generator, 3, 1));
    let mut farm = HideoutArea::new(AreaType::CurrencyFarm, 1, 10);
    farm.slots[0].item = Some(ItemRecord::new("tpl_graphics_card"));
    profile.hideout.areas.push(farm);

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "recipe_coin_mint",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);

    tick(&mut profile, &catalog, 1000);

    let craft = profile
        .hideout
        .production
        .get("recipe_coin_mint")
        .and_then(|entry| entry.as_ref())
        .expect("farm craft");
    assert!(craft.products.is_empty());
    assert_eq!(craft.progress, 0.0);
}

#[test]
fn gpu_boost_accelerates_accrual() {
    let catalog = base_catalog().with_recipe(currency_recipe(1000.0, 10));
    let mut profile = profile_with_generator();
    let mut farm = HideoutArea::new(AreaType::CurrencyFarm, 1, 10);
    for slot in farm.slots.iter_mut().take(5) {
        slot.item = Some(ItemRecord::new("tpl_graphics_card"));
    }
    profile.hideout.areas.push(farm);

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "recipe_coin_mint",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);

    tick(&mut profile, &catalog, 100);

    let craft = profile
        .hideout
        .production
        .get("recipe_coin_mint")
        .and_then(|entry| entry.as_ref())
        .expect("farm craft");
    // 5 GPUs at the default boost rate: multiplier = 1 + 4 * 0.041225
    let expected = (100.0_f64 * (1.0 + 4.0 * 0.041225)).floor();
    assert_eq!(craft.progress, expected);
}

#[test]
fn cultist_circle_flips_terminal_and_stays() {
    let circle_recipe = Recipe {
        id: "r_circle".to_string(),
        area_type: AreaType::CultistCircle,
        production_time: 100.0,
        end_product: "tpl_out".to_string(),
        count: 1,
        continuous: false,
        needs_fuel_for_all_production_time: false,
        production_limit_count: None,
    };
    let catalog = base_catalog().with_recipe(circle_recipe);
    let mut profile = profile_with_generator();

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "r_circle",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);

    tick(&mut profile, &catalog, 150);

    let craft = profile
        .hideout
        .production
        .get("r_circle")
        .and_then(|entry| entry.as_ref())
        .expect("circle craft");
    assert!(craft.available_for_finish);
    assert!(!craft.in_progress);
    assert_eq!(craft.progress, 0.0);

    // Terminal state is a no-op on later ticks
    tick(&mut profile, &catalog, 300);
    let craft = profile
        .hideout
        .production
        .get("r_circle")
        .and_then(|entry| entry.as_ref())
        .expect("circle craft");
    assert!(craft.available_for_finish);
    assert_eq!(craft.progress, 0.0);
}

#[test]
fn malformed_production_entries_are_garbage_collected() {
    let catalog = base_catalog().with_recipe(standard_recipe("r1", 100.0, false));
    let mut profile = profile_with_generator();
    profile
        .hideout
        .production
        .insert("cancelled_craft".to_string(), None);

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "r1",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);

    tick(&mut profile, &catalog, 10);

    assert!(!profile.hideout.production.contains_key("cancelled_craft"));
    assert!(profile.hideout.production.contains_key("r1"));
}

#[test]
fn missing_recipe_skips_that_craft_not_the_batch() {
    let catalog = base_catalog().with_recipe(standard_recipe("r1", 100.0, false));
    let mut profile = profile_with_generator();

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "r1",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    // A craft whose recipe vanished from the catalog after an admin reload
    let orphan = Production::new(&standard_recipe("r_gone", 50.0, false), 50.0, 0);
    assert_eq!(orphan.kind, ProductionKind::Standard);
    profile
        .hideout
        .production
        .insert("r_gone".to_string(), Some(orphan));
    profile.hideout.last_tick_timestamp = Some(0);

    tick(&mut profile, &catalog, 30);

    // Sibling craft advanced even though the orphan was skipped
    assert_eq!(progress_of(&profile, "r1"), 30.0);
    assert_eq!(progress_of(&profile, "r_gone"), 0.0);
}

#[test]
fn collecting_currency_output_clears_products() {
    let catalog = base_catalog().with_recipe(currency_recipe(100.0, 3));
    let mut profile = profile_with_generator();
    let mut farm = HideoutArea::new(AreaType::CurrencyFarm, 1, 10);
    farm.slots[0].item = Some(ItemRecord::new("tpl_graphics_card"));
    profile.hideout.areas.push(farm);

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "recipe_coin_mint",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);
    tick(&mut profile, &catalog, 250);

    let before = profile.inventory.items.len();
    let mut collect_output = EventOutput::new();
    collect_currency_output(
        &mut profile,
        &catalog,
        &HideoutConfig::default(),
        &mut collect_output,
        250,
    );

    assert!(!collect_output.has_warnings());
    assert_eq!(profile.inventory.items.len(), before + 2);
    // All delivered coins carry found-in-raid
    assert!(profile
        .inventory
        .items
        .iter()
        .filter(|item| item.tpl == "tpl_crypto_coin")
        .all(|item| item.is_found_in_raid()));

    let craft = profile
        .hideout
        .production
        .get("recipe_coin_mint")
        .and_then(|entry| entry.as_ref())
        .expect("farm craft");
    assert!(craft.products.is_empty());
}

#[test]
fn collection_aborts_when_stash_is_full() {
    let catalog = base_catalog().with_recipe(currency_recipe(100.0, 3));
    let mut profile = profile_with_generator();
    profile.inventory.capacity = 0;
    let mut farm = HideoutArea::new(AreaType::CurrencyFarm, 1, 10);
    farm.slots[0].item = Some(ItemRecord::new("tpl_graphics_card"));
    profile.hideout.areas.push(farm);

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "recipe_coin_mint",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );
    profile.hideout.last_tick_timestamp = Some(0);
    tick(&mut profile, &catalog, 150);

    let mut collect_output = EventOutput::new();
    collect_currency_output(
        &mut profile,
        &catalog,
        &HideoutConfig::default(),
        &mut collect_output,
        150,
    );

    assert!(collect_output.has_warnings());
    // Products stay put for a later attempt
    let craft = profile
        .hideout
        .production
        .get("recipe_coin_mint")
        .and_then(|entry| entry.as_ref())
        .expect("farm craft");
    assert_eq!(craft.products.len(), 1);
}

#[test]
fn crafting_skill_shortens_production_time() {
    let catalog = base_catalog().with_recipe(standard_recipe("r1", 1000.0, false));
    let mut profile = profile_with_generator();
    // Level 20 crafting at 0.75%/level: 15% faster
    profile.skills.add_points(SkillKind::Crafting, 2000.0, 0);

    let mut output = EventOutput::new();
    start_production(
        &mut profile,
        "r1",
        &[],
        &catalog,
        &SkillsConfig::default(),
        &mut output,
        0,
    );

    let craft = profile
        .hideout
        .production
        .get("r1")
        .and_then(|entry| entry.as_ref())
        .expect("craft");
    assert!((craft.production_time - 850.0).abs() < 1e-9);
}
