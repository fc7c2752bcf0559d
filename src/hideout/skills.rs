//! Skill bonus calculator.
//!
//! Pure functions over stored skill progress and configured per-level rates.
//! Progress is stored as `level * 100` with 5100 (level 51, elite) as the
//! hard cap. Level 51 grants the same bonus as level 50: the elite tier
//! unlocks other perks but must not add one more bonus increment.

/// Highest level that contributes to a per-level bonus.
const BONUS_LEVEL_CAP: f64 = 50.0;

/// Multiplier derived from a skill's progress and an "amount per level" rate
/// (in percent). Returns a fraction in `0.0..=0.5` for sane rates; 0 when the
/// skill is absent or untrained.
pub fn bonus_multiplier(progress: f64, amount_per_level: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }

    let level = (progress / 100.0).floor().min(BONUS_LEVEL_CAP + 1.0);
    // Level 51 is clamped down to 50 so elite does not grant an extra step
    let level = if level > BONUS_LEVEL_CAP {
        BONUS_LEVEL_CAP
    } else {
        level
    };

    level * amount_per_level / 100.0
}

/// Seconds to subtract from a craft's base production time for one skill.
pub fn production_time_reduction(
    production_time: f64,
    progress: f64,
    amount_per_level: f64,
) -> f64 {
    production_time * bonus_multiplier(progress, amount_per_level)
}

/// Combined consumption multiplier for resource drains.
///
/// `penalty_rate` is the (already sign-inverted) rate coming from
/// consumption-increasing profile bonuses; `reduction_rate` is the skill
/// reduction. The result is floored at 0 so a runaway negative bonus can
/// never turn consumption into regeneration.
pub fn consumption_multiplier(penalty_rate: f64, reduction_rate: f64) -> f64 {
    let combined = 1.0 - (penalty_rate + reduction_rate);
    combined.max(0.0)
}

/// Drain multiplier for the water filter. Mirrors the consumption multiplier
/// but keeps the legacy quirk that a zero combined bonus means "no
/// adjustment" rather than "free filters".
pub fn water_drain_multiplier(management_bonus: f64, crafting_bonus: f64) -> f64 {
    let combined = management_bonus + crafting_bonus;
    if combined == 0.0 {
        return 1.0;
    }
    (1.0 - combined).max(0.0)
}
