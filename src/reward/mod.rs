//! Reward application engine.
//!
//! Applies a heterogeneous list of reward effects to a profile: skill
//! points, experience, trader standing, item grants, recipe unlocks, stash
//! rows, pocket replacement, cosmetic unlocks. Item rewards are staged and
//! returned so the caller decides how they reach the player. Unknown or
//! unimplemented kinds log and are skipped, never fatal.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ItemKind};
use crate::logutil::escape_log;
use crate::profile::{inventory, Bonus, BonusType, ItemRecord, Profile, SkillKind};
use crate::response::EventOutput;

/// Reward effect kinds the engine knows how to apply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Skill,
    Experience,
    TraderStanding,
    Item,
    /// Unlocks a crafting recipe in the profile.
    ProductionScheme,
    StashRows,
    /// Replaces the profile's pocket item template.
    Pockets,
    Customization,
    /// Client-side popup; nothing for the simulation core to do.
    NotificationPopup,
}

/// One reward entry from a quest or achievement definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub kind: RewardKind,
    /// Kind-specific target: skill name, trader id, recipe id, pocket tpl.
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub value: f64,
    /// Item trees granted by `Item` rewards.
    #[serde(default)]
    pub items: Vec<ItemRecord>,
    /// Edition whitelist; empty means every edition.
    #[serde(default)]
    pub available_in_editions: Vec<String>,
    /// Edition blacklist.
    #[serde(default)]
    pub not_available_in_editions: Vec<String>,
}

/// Edition inclusion/exclusion filtering.
pub fn reward_is_for_edition(reward: &Reward, edition: &str) -> bool {
    if !reward.available_in_editions.is_empty()
        && !reward.available_in_editions.iter().any(|e| e == edition)
    {
        return false;
    }

    if reward
        .not_available_in_editions
        .iter()
        .any(|e| e == edition)
    {
        return false;
    }

    true
}

/// Apply rewards to a profile. Returns the staged item grants (with fresh
/// identities and found-in-raid applied) for the caller to deliver.
pub fn apply_rewards(
    rewards: &[Reward],
    profile: &mut Profile,
    catalog: &Catalog,
    output: &mut EventOutput,
    now: i64,
) -> Vec<ItemRecord> {
    for reward in rewards {
        if !reward_is_for_edition(reward, &profile.edition) {
            continue;
        }

        match reward.kind {
            RewardKind::Skill => match SkillKind::parse(&reward.target) {
                Some(kind) => profile.skills.add_points(kind, reward.value, now),
                None => {
                    log::error!("Unknown skill in reward target: {}", escape_log(&reward.target));
                }
            },
            RewardKind::Experience => {
                profile.experience += reward.value as i64;
                // Recompute level in case the player just crossed a threshold
                profile.recalculate_level(catalog.experience_table());
            }
            RewardKind::TraderStanding => {
                *profile
                    .trader_standings
                    .entry(reward.target.clone())
                    .or_default() += reward.value;
            }
            RewardKind::Item => {
                // Staged by the collection pass below
            }
            RewardKind::ProductionScheme => {
                unlock_recipe(profile, reward, catalog, output);
            }
            RewardKind::StashRows => {
                add_stash_rows(profile, reward.value);
            }
            RewardKind::Pockets => {
                replace_pockets(profile, &reward.target);
            }
            RewardKind::Customization => {
                if !profile.customization_unlocks.contains(&reward.target) {
                    profile.customization_unlocks.push(reward.target.clone());
                }
            }
            RewardKind::NotificationPopup => {
                log::error!("Unhandled reward kind: NotificationPopup");
            }
        }
    }

    collect_reward_items(rewards, &profile.edition, catalog)
}

/// Write a recipe unlock into the profile and echo it into the response.
fn unlock_recipe(
    profile: &mut Profile,
    reward: &Reward,
    catalog: &Catalog,
    output: &mut EventOutput,
) {
    if catalog.recipe(&reward.target).is_none() {
        log::error!(
            "Recipe unlock reward references unknown recipe {}",
            escape_log(&reward.target)
        );
        return;
    }

    if !profile.unlocked_recipes.contains(&reward.target) {
        profile.unlocked_recipes.push(reward.target.clone());
    }
    output.mark_recipe_unlocked(&reward.target);
}

/// Add stash rows, folding into an existing bonus when present.
fn add_stash_rows(profile: &mut Profile, rows: f64) {
    match profile
        .bonuses
        .iter()
        .position(|bonus| bonus.bonus_type == BonusType::StashRows)
    {
        Some(index) => profile.bonuses[index].value += rows,
        None => profile.bonuses.push(Bonus {
            id: uuid::Uuid::new_v4().to_string(),
            bonus_type: BonusType::StashRows,
            value: rows,
            is_passive: true,
        }),
    }
}

/// Swap the profile's pocket item to a new template.
fn replace_pockets(profile: &mut Profile, new_tpl: &str) {
    match profile
        .inventory
        .items
        .iter_mut()
        .find(|item| item.slot_id.as_deref() == Some("Pockets"))
    {
        Some(pockets) => pockets.tpl = new_tpl.to_string(),
        None => log::warn!("Profile {} has no pockets item to replace", profile.id),
    }
}

/// Flatten item grants from applicable rewards, splitting oversized stacks
/// and propagating found-in-raid from each root to children (ammo and money
/// never inherit it).
fn collect_reward_items(rewards: &[Reward], edition: &str, catalog: &Catalog) -> Vec<ItemRecord> {
    let mut granted = Vec::new();

    for reward in rewards {
        if reward.kind != RewardKind::Item || !reward_is_for_edition(reward, edition) {
            continue;
        }
        if reward.items.is_empty() {
            continue;
        }

        let max_stack = catalog
            .item(&reward.items[0].tpl)
            .map(|tpl| tpl.max_stack_size.max(1))
            .unwrap_or(1);

        let mut remaining = reward.items[0].stack_count();
        while remaining > 0 {
            let mut tree = reward.items.clone();
            inventory::reissue_identities(&mut tree);

            let stack_size = remaining.min(max_stack);
            {
                let root = tree[0].ensure_upd();
                root.stack_count = stack_size;
                root.spawned_in_session = true;
            }
            for item in tree.iter_mut().skip(1) {
                let inherits = catalog
                    .item(&item.tpl)
                    .map(|tpl| !matches!(tpl.kind, ItemKind::Ammo | ItemKind::Money))
                    .unwrap_or(true);
                if inherits {
                    item.ensure_upd().spawned_in_session = true;
                }
            }

            granted.extend(tree);
            remaining -= stack_size;
        }
    }

    granted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AreaType, ItemTemplate, Recipe};
    use crate::profile::ItemUpd;

    fn skill_reward(target: &str, value: f64) -> Reward {
        Reward {
            kind: RewardKind::Skill,
            target: target.to_string(),
            value,
            items: Vec::new(),
            available_in_editions: Vec::new(),
            not_available_in_editions: Vec::new(),
        }
    }

    #[test]
    fn edition_whitelist_excludes() {
        let mut reward = skill_reward("crafting", 100.0);
        reward.available_in_editions = vec!["deluxe".to_string()];

        assert!(!reward_is_for_edition(&reward, "standard"));
        assert!(reward_is_for_edition(&reward, "deluxe"));
    }

    #[test]
    fn edition_blacklist_excludes() {
        let mut reward = skill_reward("crafting", 100.0);
        reward.not_available_in_editions = vec!["standard".to_string()];

        assert!(!reward_is_for_edition(&reward, "standard"));
        assert!(reward_is_for_edition(&reward, "deluxe"));
    }

    #[test]
    fn skill_reward_applies_points() {
        let catalog = Catalog::empty();
        let mut profile = Profile::new("p1", "standard");
        let mut output = EventOutput::new();

        apply_rewards(
            &[skill_reward("crafting", 150.0)],
            &mut profile,
            &catalog,
            &mut output,
            1,
        );

        assert_eq!(profile.skills.progress(SkillKind::Crafting), 150.0);
    }

    #[test]
    fn unknown_skill_target_is_skipped() {
        let catalog = Catalog::empty();
        let mut profile = Profile::new("p1", "standard");
        let mut output = EventOutput::new();

        apply_rewards(
            &[skill_reward("basket_weaving", 150.0)],
            &mut profile,
            &catalog,
            &mut output,
            1,
        );

        assert!(profile.skills.skills.is_empty());
    }

    #[test]
    fn recipe_unlock_written_and_echoed() {
        let catalog = Catalog::empty().with_recipe(Recipe {
            id: "recipe_x".to_string(),
            area_type: AreaType::Workbench,
            production_time: 60.0,
            end_product: "tpl_x".to_string(),
            count: 1,
            continuous: false,
            needs_fuel_for_all_production_time: false,
            production_limit_count: None,
        });
        let mut profile = Profile::new("p1", "standard");
        let mut output = EventOutput::new();

        let reward = Reward {
            kind: RewardKind::ProductionScheme,
            target: "recipe_x".to_string(),
            value: 0.0,
            items: Vec::new(),
            available_in_editions: Vec::new(),
            not_available_in_editions: Vec::new(),
        };
        apply_rewards(&[reward], &mut profile, &catalog, &mut output, 1);

        assert_eq!(profile.unlocked_recipes, vec!["recipe_x".to_string()]);
        assert_eq!(output.recipe_unlocked.get("recipe_x"), Some(&true));
    }

    #[test]
    fn stash_rows_fold_into_existing_bonus() {
        let catalog = Catalog::empty();
        let mut profile = Profile::new("p1", "standard");
        let mut output = EventOutput::new();

        let reward = Reward {
            kind: RewardKind::StashRows,
            target: String::new(),
            value: 2.0,
            items: Vec::new(),
            available_in_editions: Vec::new(),
            not_available_in_editions: Vec::new(),
        };
        apply_rewards(&[reward.clone()], &mut profile, &catalog, &mut output, 1);
        apply_rewards(&[reward], &mut profile, &catalog, &mut output, 1);

        assert_eq!(profile.bonuses.len(), 1);
        assert_eq!(profile.bonus_value_sum(BonusType::StashRows), 4.0);
    }

    #[test]
    fn item_grants_split_oversized_stacks() {
        let catalog = Catalog::empty().with_item(ItemTemplate {
            id: "tpl_rounds".to_string(),
            name: "Rounds".to_string(),
            kind: ItemKind::Ammo,
            max_stack_size: 60,
            max_resource: None,
        });

        let mut stack = ItemRecord::new("tpl_rounds");
        stack.upd = Some(ItemUpd {
            stack_count: 150,
            ..Default::default()
        });

        let reward = Reward {
            kind: RewardKind::Item,
            target: String::new(),
            value: 0.0,
            items: vec![stack],
            available_in_editions: Vec::new(),
            not_available_in_editions: Vec::new(),
        };

        let mut profile = Profile::new("p1", "standard");
        let mut output = EventOutput::new();
        let granted = apply_rewards(&[reward], &mut profile, &catalog, &mut output, 1);

        assert_eq!(granted.len(), 3);
        let sizes: Vec<u32> = granted.iter().map(|item| item.stack_count()).collect();
        assert_eq!(sizes, vec![60, 60, 30]);
        // Each split stack gets its own identity
        assert_ne!(granted[0].id, granted[1].id);
    }

    #[test]
    fn experience_reward_recomputes_level() {
        let catalog = Catalog::empty().with_globals(crate::catalog::GlobalTables {
            experience_table: vec![0, 1000, 3000],
        });
        let mut profile = Profile::new("p1", "standard");
        let mut output = EventOutput::new();

        let reward = Reward {
            kind: RewardKind::Experience,
            target: String::new(),
            value: 1500.0,
            items: Vec::new(),
            available_in_editions: Vec::new(),
            not_available_in_editions: Vec::new(),
        };
        apply_rewards(&[reward], &mut profile, &catalog, &mut output, 1);

        assert_eq!(profile.experience, 1500);
        assert_eq!(profile.level, 2);
    }
}
