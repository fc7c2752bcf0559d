//! Read-only recipe, hideout-area, and item-template catalog.
//!
//! Catalog data is loaded once at startup from JSON seed files in
//! `data/seeds/` so admins can customize content without recompiling. The
//! simulation core only ever reads from the catalog; reloads are an admin
//! concern outside this module.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Hideout area categories. Production recipes carry the area they run in,
/// profile areas carry the same tag for slot/resource bookkeeping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
    Generator,
    WaterCollector,
    AirFilteringUnit,
    CurrencyFarm,
    ScavCase,
    CultistCircle,
    Workbench,
    Lavatory,
    MedStation,
    Intelligence,
}

/// Coarse item category. Used for found-in-raid propagation exemptions and
/// resource capacity lookups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Ammo,
    Money,
    Fuel,
    Filter,
    Barter,
    Gear,
    Tool,
}

/// Immutable item template definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    /// Largest stack a single inventory item of this template may hold.
    pub max_stack_size: u32,
    /// Capacity of the consumable resource, for fuel/filter items.
    pub max_resource: Option<f64>,
}

/// Crafting recipe definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub area_type: AreaType,
    /// Base seconds required, before per-profile skill adjustment.
    pub production_time: f64,
    pub end_product: String,
    pub count: u32,
    /// Continuous recipes keep yielding output units instead of completing once.
    pub continuous: bool,
    /// Craft only advances while the generator is powered.
    pub needs_fuel_for_all_production_time: bool,
    /// Output storage slots for continuous recipes.
    pub production_limit_count: Option<u32>,
}

/// Hideout area definition (catalog side).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaDefinition {
    pub area_type: AreaType,
    /// Whether elapsed time for crafts in this area is discounted while the
    /// generator is off. Areas like the lavatory run at full speed unpowered.
    pub needs_fuel: bool,
}

/// Global tuning tables shared by every profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalTables {
    /// Cumulative experience required per player level, index 0 = level 1.
    pub experience_table: Vec<i64>,
}

/// In-memory catalog; immutable for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    recipes: HashMap<String, Recipe>,
    areas: HashMap<AreaType, AreaDefinition>,
    items: HashMap<String, ItemTemplate>,
    globals: GlobalTables,
}

impl Catalog {
    /// Empty catalog, for tests that insert their own definitions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load all seed files from a directory (`items.json`, `recipes.json`,
    /// `areas.json`, `globals.json`).
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CoreError> {
        let dir = dir.as_ref();

        let items: Vec<ItemTemplate> = read_seed(&dir.join("items.json"))?;
        let recipes: Vec<Recipe> = read_seed(&dir.join("recipes.json"))?;
        let areas: Vec<AreaDefinition> = read_seed(&dir.join("areas.json"))?;
        let globals: GlobalTables = read_seed(&dir.join("globals.json"))?;

        let mut catalog = Self::empty();
        catalog.globals = globals;
        for item in items {
            catalog.items.insert(item.id.clone(), item);
        }
        for recipe in recipes {
            catalog.recipes.insert(recipe.id.clone(), recipe);
        }
        for area in areas {
            catalog.areas.insert(area.area_type, area);
        }

        log::info!(
            "Catalog loaded: {} items, {} recipes, {} areas",
            catalog.items.len(),
            catalog.recipes.len(),
            catalog.areas.len()
        );

        Ok(catalog)
    }

    pub fn recipe(&self, recipe_id: &str) -> Option<&Recipe> {
        self.recipes.get(recipe_id)
    }

    pub fn item(&self, template_id: &str) -> Option<&ItemTemplate> {
        self.items.get(template_id)
    }

    pub fn area(&self, area_type: AreaType) -> Option<&AreaDefinition> {
        self.areas.get(&area_type)
    }

    /// The continuous currency-generation recipe, if seeded.
    pub fn currency_recipe(&self) -> Option<&Recipe> {
        self.recipes
            .values()
            .find(|recipe| recipe.area_type == AreaType::CurrencyFarm && recipe.continuous)
    }

    /// The water collector's purified-water recipe, if seeded.
    pub fn water_recipe(&self) -> Option<&Recipe> {
        self.recipes
            .values()
            .find(|recipe| recipe.area_type == AreaType::WaterCollector)
    }

    pub fn experience_table(&self) -> &[i64] {
        &self.globals.experience_table
    }

    /// Insert an item template (test/builder use).
    pub fn with_item(mut self, item: ItemTemplate) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    /// Insert a recipe (test/builder use).
    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.recipes.insert(recipe.id.clone(), recipe);
        self
    }

    /// Insert an area definition (test/builder use).
    pub fn with_area(mut self, area: AreaDefinition) -> Self {
        self.areas.insert(area.area_type, area);
        self
    }

    /// Set the global tables (test/builder use).
    pub fn with_globals(mut self, globals: GlobalTables) -> Self {
        self.globals = globals;
        self
    }

    /// Write default seed files into `dir` if they do not exist yet.
    /// Used by `outpost init` to produce an editable starting point.
    pub fn write_default_seeds<P: AsRef<Path>>(dir: P) -> Result<(), CoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        write_seed_if_missing(&dir.join("items.json"), &default_items())?;
        write_seed_if_missing(&dir.join("recipes.json"), &default_recipes())?;
        write_seed_if_missing(&dir.join("areas.json"), &default_areas())?;
        write_seed_if_missing(&dir.join("globals.json"), &default_globals())?;

        Ok(())
    }
}

fn read_seed<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to parse {}: {}", path.display(), e),
        ))
    })
}

fn write_seed_if_missing<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    if path.exists() {
        return Ok(());
    }
    let contents = serde_json::to_string_pretty(value).map_err(|e| {
        CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to serialize {}: {}", path.display(), e),
        ))
    })?;
    fs::write(path, contents)?;
    log::info!("Wrote default seed file {}", path.display());
    Ok(())
}

fn default_items() -> Vec<ItemTemplate> {
    vec![
        ItemTemplate {
            id: "tpl_fuel_tank".to_string(),
            name: "Expeditionary fuel tank".to_string(),
            kind: ItemKind::Fuel,
            max_stack_size: 1,
            max_resource: Some(60.0),
        },
        ItemTemplate {
            id: "tpl_water_filter".to_string(),
            name: "Water filter".to_string(),
            kind: ItemKind::Filter,
            max_stack_size: 1,
            max_resource: Some(100.0),
        },
        ItemTemplate {
            id: "tpl_air_filter".to_string(),
            name: "Air filter absorber".to_string(),
            kind: ItemKind::Filter,
            max_stack_size: 1,
            max_resource: Some(300.0),
        },
        ItemTemplate {
            id: "tpl_graphics_card".to_string(),
            name: "Graphics card".to_string(),
            kind: ItemKind::Barter,
            max_stack_size: 1,
            max_resource: None,
        },
        ItemTemplate {
            id: "tpl_crypto_coin".to_string(),
            name: "Physical crypto coin".to_string(),
            kind: ItemKind::Barter,
            max_stack_size: 1,
            max_resource: None,
        },
        ItemTemplate {
            id: "tpl_purified_water".to_string(),
            name: "Canister of purified water".to_string(),
            kind: ItemKind::Barter,
            max_stack_size: 1,
            max_resource: None,
        },
        ItemTemplate {
            id: "tpl_rifle_rounds".to_string(),
            name: "Rifle rounds".to_string(),
            kind: ItemKind::Ammo,
            max_stack_size: 60,
            max_resource: None,
        },
        ItemTemplate {
            id: "tpl_cash".to_string(),
            name: "Cash".to_string(),
            kind: ItemKind::Money,
            max_stack_size: 500_000,
            max_resource: None,
        },
        ItemTemplate {
            id: "tpl_multitool".to_string(),
            name: "Multitool".to_string(),
            kind: ItemKind::Tool,
            max_stack_size: 1,
            max_resource: None,
        },
    ]
}

fn default_recipes() -> Vec<Recipe> {
    vec![
        Recipe {
            id: "recipe_purified_water".to_string(),
            area_type: AreaType::WaterCollector,
            production_time: 5266.0,
            end_product: "tpl_purified_water".to_string(),
            count: 1,
            continuous: false,
            needs_fuel_for_all_production_time: false,
            production_limit_count: None,
        },
        Recipe {
            id: "recipe_coin_mint".to_string(),
            area_type: AreaType::CurrencyFarm,
            production_time: 145_000.0,
            end_product: "tpl_crypto_coin".to_string(),
            count: 1,
            continuous: true,
            needs_fuel_for_all_production_time: true,
            production_limit_count: Some(3),
        },
        Recipe {
            id: "recipe_rifle_rounds".to_string(),
            area_type: AreaType::Workbench,
            production_time: 2700.0,
            end_product: "tpl_rifle_rounds".to_string(),
            count: 120,
            continuous: false,
            needs_fuel_for_all_production_time: false,
            production_limit_count: None,
        },
    ]
}

fn default_areas() -> Vec<AreaDefinition> {
    vec![
        AreaDefinition {
            area_type: AreaType::Generator,
            needs_fuel: false,
        },
        AreaDefinition {
            area_type: AreaType::WaterCollector,
            needs_fuel: true,
        },
        AreaDefinition {
            area_type: AreaType::AirFilteringUnit,
            needs_fuel: true,
        },
        AreaDefinition {
            area_type: AreaType::CurrencyFarm,
            needs_fuel: true,
        },
        AreaDefinition {
            area_type: AreaType::ScavCase,
            needs_fuel: false,
        },
        AreaDefinition {
            area_type: AreaType::CultistCircle,
            needs_fuel: false,
        },
        AreaDefinition {
            area_type: AreaType::Workbench,
            needs_fuel: true,
        },
        AreaDefinition {
            area_type: AreaType::Lavatory,
            needs_fuel: false,
        },
        AreaDefinition {
            area_type: AreaType::MedStation,
            needs_fuel: true,
        },
        AreaDefinition {
            area_type: AreaType::Intelligence,
            needs_fuel: true,
        },
    ]
}

fn default_globals() -> GlobalTables {
    GlobalTables {
        experience_table: vec![
            0, 1_000, 3_857, 8_079, 13_678, 20_666, 29_057, 38_769, 49_816, 62_222,
        ],
    }
}
