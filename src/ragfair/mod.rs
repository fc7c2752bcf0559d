//! Player-to-player marketplace: offers with time-based expiry.
//!
//! The offer board holds every live offer. The periodic tick driver calls
//! [`OfferBoard::remove_expired`]; the buy path consumes offers through the
//! ragfair stock source (player offers are one-shot).

use serde::{Deserialize, Serialize};

use crate::profile::ItemRecord;

/// A live marketplace offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagfairOffer {
    pub id: String,
    pub seller_id: String,
    /// Offer root item plus children.
    pub items: Vec<ItemRecord>,
    /// Asking price in minor currency units.
    pub price: i64,
    /// Unix timestamp after which the offer expires.
    pub expiry_at: i64,
}

impl RagfairOffer {
    pub fn new(seller_id: impl Into<String>, items: Vec<ItemRecord>, price: i64, expiry_at: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            seller_id: seller_id.into(),
            items,
            price,
            expiry_at,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expiry_at
    }
}

/// All live marketplace offers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferBoard {
    offers: Vec<RagfairOffer>,
}

impl OfferBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_offer(&mut self, offer: RagfairOffer) -> String {
        let id = offer.id.clone();
        self.offers.push(offer);
        id
    }

    pub fn get(&self, offer_id: &str) -> Option<&RagfairOffer> {
        self.offers.iter().find(|offer| offer.id == offer_id)
    }

    /// Remove an offer (purchase consumed it, or the seller pulled it).
    pub fn remove(&mut self, offer_id: &str) -> Option<RagfairOffer> {
        let index = self.offers.iter().position(|offer| offer.id == offer_id)?;
        Some(self.offers.remove(index))
    }

    /// Drop every offer whose lifetime has run out. Returns the removed
    /// offers so the caller can route unsold items back to their sellers.
    pub fn remove_expired(&mut self, now: i64) -> Vec<RagfairOffer> {
        let mut expired = Vec::new();
        self.offers.retain(|offer| {
            if offer.is_expired(now) {
                expired.push(offer.clone());
                false
            } else {
                true
            }
        });

        if !expired.is_empty() {
            log::info!("Expired {} marketplace offers", expired.len());
        }

        expired
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}
