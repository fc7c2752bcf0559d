//! Currency movement primitives.
//!
//! Insufficient funds are reported as a warning on the response rather than
//! an error; the buy path inspects the warnings to decide what to do next.

use crate::profile::Profile;
use crate::response::EventOutput;

/// Deduct a payment from a profile. On insufficient funds nothing is
/// deducted and a warning is appended.
pub fn pay(profile: &mut Profile, amount: i64, output: &mut EventOutput) {
    if amount <= 0 {
        return;
    }

    if profile.currency < amount {
        log::warn!(
            "Profile {} cannot pay {}: balance {}",
            profile.id,
            amount,
            profile.currency
        );
        output.push_warning(format!(
            "Insufficient funds: need {}, have {}",
            amount, profile.currency
        ));
        return;
    }

    profile.currency -= amount;
}

/// Credit a profile with sale proceeds.
pub fn credit(profile: &mut Profile, amount: i64) {
    if amount <= 0 {
        return;
    }
    profile.currency += amount;
}
