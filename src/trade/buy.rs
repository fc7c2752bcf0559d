//! Atomic buy path.
//!
//! All buys run under a single process-wide lock: the check-then-decrement
//! sequence on shared assort stock must never interleave between two
//! purchasers. Buys are infrequent enough that one global lock beats
//! per-assort bookkeeping.
//!
//! The three offer origins back onto structurally different stores, so each
//! gets its own [`StockSource`] implementation; everything downstream of the
//! lookup (chunking, delivery, payment) is shared.

use std::sync::Mutex;

use crate::catalog::Catalog;
use crate::errors::CoreError;
use crate::logutil::escape_log;
use crate::profile::{inventory, ItemRecord, Profile};
use crate::ragfair::OfferBoard;
use crate::response::EventOutput;
use crate::trade::limits;
use crate::trade::payment;
use crate::trade::{BuyRequest, TraderAssort};

static BUY_LOCK: Mutex<()> = Mutex::new(());

/// One purchase origin's view of its backing store.
pub trait StockSource {
    /// Key used for purchase-limit bookkeeping on the buyer's profile.
    fn source_key(&self) -> &str;

    /// Locate the offer root item and its children (clones). `None` when the
    /// offer no longer exists.
    fn offer_items(&self, item_id: &str) -> Option<Vec<ItemRecord>>;

    /// Remaining tracked stock, or `None` for one-shot offers.
    fn tracked_stock(&self, item_id: &str) -> Option<u32>;

    /// Decrement stock and record purchase counters. Only called after
    /// delivery and payment both succeeded.
    fn commit(&mut self, buyer: &mut Profile, item_id: &str, count: u32, now: i64);
}

/// Standard trader assortment.
pub struct TraderSource<'a> {
    pub assort: &'a mut TraderAssort,
}

impl StockSource for TraderSource<'_> {
    fn source_key(&self) -> &str {
        &self.assort.trader_id
    }

    fn offer_items(&self, item_id: &str) -> Option<Vec<ItemRecord>> {
        let items = inventory::find_item_and_children(&self.assort.items, item_id);
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }

    fn tracked_stock(&self, item_id: &str) -> Option<u32> {
        self.assort.stock_of(item_id)
    }

    fn commit(&mut self, buyer: &mut Profile, item_id: &str, count: u32, now: i64) {
        let restricted = self
            .assort
            .root_item(item_id)
            .map(|item| item.has_buy_restriction())
            .unwrap_or(false);

        self.assort.decrement_stock(item_id, count);

        if restricted {
            limits::record_purchase(buyer, &self.assort.trader_id, item_id, count, now);
        }
    }
}

/// The special NPC vendor. Stock behaves like a trader's, but an exhausted
/// entry is removed from the assortment entirely.
pub struct VendorSource<'a> {
    pub assort: &'a mut TraderAssort,
}

impl StockSource for VendorSource<'_> {
    fn source_key(&self) -> &str {
        &self.assort.trader_id
    }

    fn offer_items(&self, item_id: &str) -> Option<Vec<ItemRecord>> {
        let items = inventory::find_item_and_children(&self.assort.items, item_id);
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }

    fn tracked_stock(&self, item_id: &str) -> Option<u32> {
        self.assort.stock_of(item_id)
    }

    fn commit(&mut self, _buyer: &mut Profile, item_id: &str, count: u32, _now: i64) {
        self.assort.decrement_stock(item_id, count);
        if self.assort.stock_of(item_id) == Some(0) {
            self.assort.remove_entry(item_id);
        }
    }
}

/// A player marketplace offer. One-shot: no tracked stock, and a completed
/// purchase consumes the offer.
pub struct RagfairSource<'a> {
    pub board: &'a mut OfferBoard,
}

impl StockSource for RagfairSource<'_> {
    fn source_key(&self) -> &str {
        "ragfair"
    }

    fn offer_items(&self, item_id: &str) -> Option<Vec<ItemRecord>> {
        self.board.get(item_id).map(|offer| offer.items.clone())
    }

    fn tracked_stock(&self, _item_id: &str) -> Option<u32> {
        None
    }

    fn commit(&mut self, buyer: &mut Profile, item_id: &str, count: u32, now: i64) {
        let restricted = self
            .board
            .get(item_id)
            .and_then(|offer| offer.items.first())
            .map(|item| item.has_buy_restriction())
            .unwrap_or(false);
        if restricted {
            limits::record_purchase(buyer, "ragfair", item_id, count, now);
        }

        self.board.remove(item_id);
    }
}

/// Execute a buy against a resolved stock source.
///
/// Order of operations, all under the buy lock: locate offer, check purchase
/// limit, check stock, chunk into max-stack-sized deliveries with fresh
/// identities, deliver, pay, commit the stock decrement. A delivery warning
/// aborts before payment; a payment warning keeps the delivered items (no
/// rollback) and skips the stock decrement.
pub fn buy_item(
    buyer: &mut Profile,
    request: &BuyRequest,
    source: &mut dyn StockSource,
    catalog: &Catalog,
    output: &mut EventOutput,
    now: i64,
) -> Result<(), CoreError> {
    let _guard = BUY_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    // 1. Locate the offer; it may have been exhausted or removed concurrently
    let offer_items = source.offer_items(&request.item_id).ok_or_else(|| {
        log::debug!(
            "Tried to buy offer {} from {} that no longer exists",
            escape_log(&request.item_id),
            source.source_key()
        );
        CoreError::OfferNotFound(request.item_id.clone())
    })?;
    let root = offer_items
        .first()
        .ok_or_else(|| CoreError::OfferNotFound(request.item_id.clone()))?;

    // 2. Per-cycle purchase limit, fatal before any mutation
    if root.has_buy_restriction() {
        limits::check_within_purchase_limit(
            buyer,
            source.source_key(),
            root,
            &request.item_id,
            request.count,
        )?;
    }

    // 3. Tracked stock must cover the request in full, no partial fulfilment
    if let Some(stock) = source.tracked_stock(&request.item_id) {
        if stock < request.count {
            return Err(CoreError::InsufficientStock {
                trader: source.source_key().to_string(),
                requested: request.count,
                stock,
            });
        }
    }

    // 4. Split into stack-sized chunks, each a fresh-identity clone of the offer
    let template = catalog
        .item(&root.tpl)
        .ok_or_else(|| CoreError::TemplateNotFound(root.tpl.clone()))?;
    let max_stack = template.max_stack_size.max(1);

    let mut stacks: Vec<Vec<ItemRecord>> = Vec::new();
    let mut remaining = request.count;
    while remaining > 0 {
        let mut chunk = offer_items.clone();
        inventory::reissue_identities(&mut chunk);
        let stack_size = remaining.min(max_stack);
        chunk[0].ensure_upd().stack_count = stack_size;
        stacks.push(chunk);
        remaining -= stack_size;
    }

    // 5. Deliver; a warning here means no money changes hands
    inventory::add_items_to_stash(
        &mut buyer.inventory,
        stacks,
        request.found_in_raid,
        catalog,
        output,
    );
    if output.has_warnings() {
        return Ok(());
    }

    // 6. Payment. Failure keeps the delivered items in place (accepted
    // asymmetry) and skips the stock decrement.
    payment::pay(buyer, request.price, output);
    if output.has_warnings() {
        let detail = output
            .warnings
            .last()
            .cloned()
            .unwrap_or_else(|| "unknown payment error".to_string());
        log::warn!("Transaction failed after delivery: {}", detail);
        output.push_warning(format!("Transaction failed: {detail}"));
        return Ok(());
    }

    // 7. Only now does the source-side stock move
    source.commit(buyer, &request.item_id, request.count, now);

    Ok(())
}
