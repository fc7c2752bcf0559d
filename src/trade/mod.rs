//! Trade engine: atomic purchases from traders, the special NPC vendor, and
//! the player marketplace, plus the sell path and per-cycle purchase limits.

pub mod buy;
pub mod limits;
pub mod payment;
pub mod sell;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::errors::CoreError;
use crate::profile::{inventory, ItemRecord, Profile};
use crate::ragfair::OfferBoard;
use crate::response::EventOutput;

pub use buy::{buy_item, RagfairSource, StockSource, TraderSource, VendorSource};
pub use sell::{sell_items, SellRequest};

/// Where a purchase is sourced from. The three origins have structurally
/// different backing stores but share the downstream item-construction and
/// payment logic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferSource {
    /// A one-shot player marketplace offer.
    Ragfair,
    /// The special NPC vendor reselling player-sold items.
    Vendor { trader_id: String },
    /// A standard trader assortment.
    Trader { trader_id: String },
}

/// A client buy request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyRequest {
    pub source: OfferSource,
    /// Offer id (ragfair) or assort root item id (trader/vendor).
    pub item_id: String,
    pub count: u32,
    /// Agreed price in minor currency units.
    pub price: i64,
    /// Whether delivered items are flagged found-in-raid.
    pub found_in_raid: bool,
}

/// A trader's (or the vendor's) sellable assortment: root items plus
/// children, with stock tracked on the root's stack count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderAssort {
    pub trader_id: String,
    pub items: Vec<ItemRecord>,
}

impl TraderAssort {
    pub fn new(trader_id: impl Into<String>) -> Self {
        Self {
            trader_id: trader_id.into(),
            items: Vec::new(),
        }
    }

    pub fn root_item(&self, item_id: &str) -> Option<&ItemRecord> {
        inventory::find_item(&self.items, item_id)
    }

    /// Remaining stock of an assort entry.
    pub fn stock_of(&self, item_id: &str) -> Option<u32> {
        self.root_item(item_id).map(|item| item.stack_count())
    }

    pub fn decrement_stock(&mut self, item_id: &str, count: u32) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) {
            let upd = item.ensure_upd();
            upd.stack_count = upd.stack_count.saturating_sub(count);
        }
    }

    /// Remove an assort entry and its children entirely.
    pub fn remove_entry(&mut self, item_id: &str) {
        let doomed = inventory::find_item_and_children(&self.items, item_id);
        let doomed_ids: Vec<&str> = doomed.iter().map(|item| item.id.as_str()).collect();
        self.items
            .retain(|item| !doomed_ids.contains(&item.id.as_str()));
    }

    /// Register an item tree into the assortment (vendor resale of items a
    /// player sold).
    pub fn register_items(&mut self, items: Vec<ItemRecord>) {
        self.items.extend(items);
    }
}

/// Resolve the stock source for a buy request by its origin tag and run the
/// purchase.
pub fn execute_buy(
    buyer: &mut Profile,
    request: &BuyRequest,
    board: &mut OfferBoard,
    traders: &mut HashMap<String, TraderAssort>,
    catalog: &Catalog,
    output: &mut EventOutput,
    now: i64,
) -> Result<(), CoreError> {
    match &request.source {
        OfferSource::Ragfair => {
            let mut source = RagfairSource { board };
            buy_item(buyer, request, &mut source, catalog, output, now)
        }
        OfferSource::Vendor { trader_id } => {
            let assort = traders
                .get_mut(trader_id)
                .ok_or_else(|| CoreError::OfferNotFound(request.item_id.clone()))?;
            let mut source = VendorSource { assort };
            buy_item(buyer, request, &mut source, catalog, output, now)
        }
        OfferSource::Trader { trader_id } => {
            let assort = traders
                .get_mut(trader_id)
                .ok_or_else(|| CoreError::OfferNotFound(request.item_id.clone()))?;
            let mut source = TraderSource { assort };
            buy_item(buyer, request, &mut source, catalog, output, now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ItemUpd;

    #[test]
    fn assort_stock_tracking() {
        let mut assort = TraderAssort::new("trader_prapor");
        let mut item = ItemRecord::new("tpl_rifle_rounds");
        item.upd = Some(ItemUpd {
            stack_count: 100,
            ..Default::default()
        });
        let id = item.id.clone();
        assort.register_items(vec![item]);

        assert_eq!(assort.stock_of(&id), Some(100));
        assort.decrement_stock(&id, 30);
        assert_eq!(assort.stock_of(&id), Some(70));
        assort.decrement_stock(&id, 100);
        assert_eq!(assort.stock_of(&id), Some(0));
    }

    #[test]
    fn remove_entry_takes_children() {
        let mut assort = TraderAssort::new("trader_prapor");
        let root = ItemRecord::new("tpl_rig");
        let mut child = ItemRecord::new("tpl_mag");
        child.parent_id = Some(root.id.clone());
        let root_id = root.id.clone();
        assort.register_items(vec![root, child]);

        assort.remove_entry(&root_id);
        assert!(assort.items.is_empty());
    }
}
