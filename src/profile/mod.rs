//! Player profile model: skills, inventory item tree, hideout state,
//! bonuses, and per-trader purchase tracking.
//!
//! Records are persisted with bincode via [`crate::storage::ProfileStore`];
//! schema versions gate deserialization of old on-disk data.

pub mod inventory;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::AreaType;
use crate::hideout::production::Production;

pub const PROFILE_SCHEMA_VERSION: u8 = 1;

/// Skill progress is stored as `level * 100`; level 51 ("elite") is the cap.
pub const MAX_SKILL_PROGRESS: f64 = 5100.0;

/// Skills the simulation core reads or trains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    Crafting,
    HideoutManagement,
    Endurance,
    Strength,
    Attention,
    Charisma,
    Metabolism,
}

impl SkillKind {
    /// Parse a reward-target skill name. Unknown names return `None` so the
    /// caller can log and skip rather than fail the batch.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "crafting" => Some(Self::Crafting),
            "hideout_management" => Some(Self::HideoutManagement),
            "endurance" => Some(Self::Endurance),
            "strength" => Some(Self::Strength),
            "attention" => Some(Self::Attention),
            "charisma" => Some(Self::Charisma),
            "metabolism" => Some(Self::Metabolism),
            _ => None,
        }
    }
}

/// One skill's progression record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillProgress {
    pub kind: SkillKind,
    /// `level * 100`, capped at [`MAX_SKILL_PROGRESS`].
    pub progress: f64,
    pub points_earned_during_session: f64,
    pub last_access: i64,
}

/// A profile's skill records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillSet {
    pub skills: Vec<SkillProgress>,
}

impl SkillSet {
    pub fn get(&self, kind: SkillKind) -> Option<&SkillProgress> {
        self.skills.iter().find(|s| s.kind == kind)
    }

    /// Stored progress for a skill, 0 when the record is absent.
    pub fn progress(&self, kind: SkillKind) -> f64 {
        self.get(kind).map(|s| s.progress).unwrap_or(0.0)
    }

    /// Elite tier is level 51 (progress 5100).
    pub fn is_elite(&self, kind: SkillKind) -> bool {
        self.progress(kind) >= MAX_SKILL_PROGRESS
    }

    /// Add points to a skill, creating the record if missing. Progress is
    /// capped at [`MAX_SKILL_PROGRESS`]; negative increments are rejected
    /// with a logged warning.
    pub fn add_points(&mut self, kind: SkillKind, points: f64, now: i64) {
        if points < 0.0 {
            log::warn!("Attempt to increment skill {:?} with negative value", kind);
            return;
        }

        let index = match self.skills.iter().position(|s| s.kind == kind) {
            Some(index) => index,
            None => {
                self.skills.push(SkillProgress {
                    kind,
                    progress: 0.0,
                    points_earned_during_session: 0.0,
                    last_access: now,
                });
                self.skills.len() - 1
            }
        };

        let record = &mut self.skills[index];
        record.progress = (record.progress + points).min(MAX_SKILL_PROGRESS);
        record.points_earned_during_session += points;
        record.last_access = now;
    }
}

/// Bonus kinds applied to a profile by hideout upgrades and rewards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BonusType {
    /// Percentage change to generator fuel consumption. Positive values
    /// increase consumption.
    FuelConsumption,
    StashRows,
    ExperienceRate,
    QuestMoneyReward,
    SkillGroupLevelingBoost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bonus {
    pub id: String,
    pub bonus_type: BonusType,
    pub value: f64,
    pub is_passive: bool,
}

/// Consumable resource state carried by fuel/filter items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResource {
    /// Remaining capacity. `None` means fresh: the item's catalog max applies.
    pub value: Option<f64>,
    /// Cumulative units consumed, tracked for skill-point awards.
    pub units_consumed: f64,
}

/// Mutable per-item state (stack size, found-in-raid flag, resource, buy
/// restrictions).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpd {
    pub stack_count: u32,
    pub spawned_in_session: bool,
    pub resource: Option<ItemResource>,
    /// Per-refresh-cycle purchase cap for restricted trader items.
    pub buy_restriction_max: Option<u32>,
}

/// One node of an inventory item tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    /// Template id into the item catalog.
    pub tpl: String,
    pub parent_id: Option<String>,
    pub slot_id: Option<String>,
    pub upd: Option<ItemUpd>,
}

impl ItemRecord {
    /// Root item with a fresh identity and stack count 1.
    pub fn new(tpl: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tpl: tpl.into(),
            parent_id: None,
            slot_id: None,
            upd: Some(ItemUpd {
                stack_count: 1,
                ..Default::default()
            }),
        }
    }

    /// Ensure the item has an upd block, creating a default one if missing.
    pub fn ensure_upd(&mut self) -> &mut ItemUpd {
        self.upd.get_or_insert_with(|| ItemUpd {
            stack_count: 1,
            ..Default::default()
        })
    }

    pub fn stack_count(&self) -> u32 {
        self.upd.as_ref().map(|u| u.stack_count.max(1)).unwrap_or(1)
    }

    pub fn is_found_in_raid(&self) -> bool {
        self.upd.as_ref().map(|u| u.spawned_in_session).unwrap_or(false)
    }

    pub fn has_buy_restriction(&self) -> bool {
        self.upd
            .as_ref()
            .and_then(|u| u.buy_restriction_max)
            .is_some()
    }
}

/// One resource-bearing slot of a hideout area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaSlot {
    pub item: Option<ItemRecord>,
}

/// A hideout area instance on a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HideoutArea {
    pub area_type: AreaType,
    pub level: u8,
    /// For the generator: whether it is currently powered. Flipped off when
    /// all fuel slots run dry.
    pub active: bool,
    pub slots: Vec<AreaSlot>,
}

impl HideoutArea {
    pub fn new(area_type: AreaType, level: u8, slot_count: usize) -> Self {
        Self {
            area_type,
            level,
            active: false,
            slots: vec![AreaSlot::default(); slot_count],
        }
    }

    /// Count slots currently holding an item.
    pub fn filled_slot_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.item.is_some()).count()
    }
}

/// Hideout state carried by a profile: areas, the production map, and the
/// last simulation-tick timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HideoutState {
    pub areas: Vec<HideoutArea>,
    /// Keyed by recipe id. `None` entries are stale cancellations that the
    /// next tick pass garbage-collects.
    pub production: HashMap<String, Option<Production>>,
    pub last_tick_timestamp: Option<i64>,
}

impl HideoutState {
    pub fn area(&self, area_type: AreaType) -> Option<&HideoutArea> {
        self.areas.iter().find(|a| a.area_type == area_type)
    }

    pub fn area_mut(&mut self, area_type: AreaType) -> Option<&mut HideoutArea> {
        self.areas.iter_mut().find(|a| a.area_type == area_type)
    }
}

/// Purchase tracking for one restricted assort item this refresh cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub count: u32,
    pub last_purchase_timestamp: i64,
}

/// Player inventory: a flat item tree rooted at the stash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<ItemRecord>,
    pub stash_root: String,
    /// Item-count capacity of the stash; deliveries beyond it warn and abort.
    pub capacity: usize,
}

impl Inventory {
    pub fn new() -> Self {
        let stash_root = uuid::Uuid::new_v4().to_string();
        Self {
            items: Vec::new(),
            stash_root,
            capacity: 256,
        }
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

/// A player profile. Production/trade engines mutate this in memory; the
/// storage layer persists it between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    /// Game edition, used for reward inclusion/exclusion filtering.
    pub edition: String,
    pub experience: i64,
    pub level: u32,
    /// Currency balance in minor units.
    pub currency: i64,
    pub skills: SkillSet,
    pub inventory: Inventory,
    pub hideout: HideoutState,
    pub bonuses: Vec<Bonus>,
    pub unlocked_recipes: Vec<String>,
    pub customization_unlocks: Vec<String>,
    pub trader_standings: HashMap<String, f64>,
    /// trader id -> assort item id -> purchases this refresh cycle.
    pub trader_purchases: HashMap<String, HashMap<String, PurchaseRecord>>,
    pub schema_version: u8,
}

impl Profile {
    pub fn new(id: impl Into<String>, edition: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            edition: edition.into(),
            experience: 0,
            level: 1,
            currency: 0,
            skills: SkillSet::default(),
            inventory: Inventory::new(),
            hideout: HideoutState::default(),
            bonuses: Vec::new(),
            unlocked_recipes: Vec::new(),
            customization_unlocks: Vec::new(),
            trader_standings: HashMap::new(),
            trader_purchases: HashMap::new(),
            schema_version: PROFILE_SCHEMA_VERSION,
        }
    }

    /// Sum of all bonus values of the given type on this profile.
    pub fn bonus_value_sum(&self, bonus_type: BonusType) -> f64 {
        self.bonuses
            .iter()
            .filter(|b| b.bonus_type == bonus_type)
            .map(|b| b.value)
            .sum()
    }

    /// Recompute the player level from the cumulative experience table.
    pub fn recalculate_level(&mut self, experience_table: &[i64]) {
        let mut level = 1u32;
        for (index, threshold) in experience_table.iter().enumerate() {
            if self.experience >= *threshold {
                level = index as u32 + 1;
            } else {
                break;
            }
        }
        self.level = level;
    }
}
