//! Per-refresh-cycle purchase limit bookkeeping.
//!
//! Restricted assort items carry a `buy_restriction_max`; purchases are
//! counted per (trader, assort item) on the buying profile and reset when
//! the trader's assortment refreshes. The refresh itself is an external
//! trigger; this module only reads and writes the counters.

use crate::errors::CoreError;
use crate::profile::{ItemRecord, Profile, PurchaseRecord};

/// Units of an assort item this profile already bought this cycle.
pub fn purchase_count(profile: &Profile, trader_id: &str, assort_id: &str) -> u32 {
    profile
        .trader_purchases
        .get(trader_id)
        .and_then(|per_trader| per_trader.get(assort_id))
        .map(|record| record.count)
        .unwrap_or(0)
}

/// Fail with `PurchaseLimitExceeded` when `count` more units would push the
/// profile past the item's per-cycle cap. Items without a restriction always
/// pass.
pub fn check_within_purchase_limit(
    profile: &Profile,
    trader_id: &str,
    assort_item: &ItemRecord,
    assort_id: &str,
    count: u32,
) -> Result<(), CoreError> {
    let Some(limit) = assort_item
        .upd
        .as_ref()
        .and_then(|upd| upd.buy_restriction_max)
    else {
        return Ok(());
    };

    let already_purchased = purchase_count(profile, trader_id, assort_id);
    if already_purchased + count > limit {
        return Err(CoreError::PurchaseLimitExceeded {
            trader: trader_id.to_string(),
            assort: assort_id.to_string(),
            requested: count,
            limit,
        });
    }

    Ok(())
}

/// Record a completed purchase against the cycle counter.
pub fn record_purchase(
    profile: &mut Profile,
    trader_id: &str,
    assort_id: &str,
    count: u32,
    now: i64,
) {
    let record = profile
        .trader_purchases
        .entry(trader_id.to_string())
        .or_default()
        .entry(assort_id.to_string())
        .or_insert_with(PurchaseRecord::default);
    record.count += count;
    record.last_purchase_timestamp = now;
}

/// Clear all purchase counters for a trader. Invoked when the trader's
/// assortment refreshes.
pub fn reset_trader_purchases(profile: &mut Profile, trader_id: &str) {
    if profile.trader_purchases.remove(trader_id).is_some() {
        log::debug!(
            "Reset purchase counters for trader {} on profile {}",
            trader_id,
            profile.id
        );
    }
}
