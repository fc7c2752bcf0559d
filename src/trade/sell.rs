//! Sell path: remove items from the seller, optionally register them with
//! the special vendor, credit the receiving party.
//!
//! Sells take no lock: they only touch the seller's own inventory and append
//! to the vendor assortment, which is acceptable to interleave.

use crate::errors::CoreError;
use crate::logutil::escape_log;
use crate::profile::{inventory, Profile};
use crate::response::EventOutput;
use crate::trade::{payment, TraderAssort};

/// A client sell request.
#[derive(Debug, Clone)]
pub struct SellRequest {
    /// Ids of the inventory items being sold.
    pub item_ids: Vec<String>,
    /// Agreed total price in minor currency units.
    pub price: i64,
}

/// Sell items out of a profile's inventory.
///
/// Every item is resolved before anything mutates: the first missing item
/// aborts the whole request with no inventory change and no payment. When
/// `vendor_assort` is given (selling to the special NPC buyer) the sold item
/// trees are registered into its outgoing assortment. The sale price goes to
/// `receiver` when set (group trades), otherwise to the seller.
pub fn sell_items(
    seller: &mut Profile,
    receiver: Option<&mut Profile>,
    request: &SellRequest,
    mut vendor_assort: Option<&mut TraderAssort>,
    output: &mut EventOutput,
) -> Result<(), CoreError> {
    // Client item ids occasionally arrive padded; strip all whitespace
    let mut resolved: Vec<String> = Vec::with_capacity(request.item_ids.len());
    for raw_id in &request.item_ids {
        let item_id: String = raw_id.chars().filter(|c| !c.is_whitespace()).collect();
        if inventory::find_item(&seller.inventory.items, &item_id).is_none() {
            log::error!(
                "Unable to sell item {}, cannot be found in player inventory",
                escape_log(raw_id)
            );
            output.push_warning(format!("Item not found: {item_id}"));
            return Err(CoreError::ItemNotFound(item_id));
        }
        resolved.push(item_id);
    }

    for item_id in &resolved {
        if let Some(assort) = vendor_assort.as_deref_mut() {
            let sold_tree = inventory::find_item_and_children(&seller.inventory.items, item_id);
            assort.register_items(sold_tree);
        }

        let removed = inventory::remove_item_and_children(&mut seller.inventory, item_id)?;
        log::debug!(
            "Sold item {} ({} nodes) from profile {}",
            escape_log(item_id),
            removed.len(),
            seller.id
        );
    }

    match receiver {
        Some(receiver) => payment::credit(receiver, request.price),
        None => payment::credit(seller, request.price),
    }

    Ok(())
}
