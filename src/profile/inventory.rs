//! Inventory item-tree primitives: lookup, removal, identity remapping, and
//! stash delivery with warning semantics.

use std::collections::HashMap;

use crate::catalog::{Catalog, ItemKind};
use crate::errors::CoreError;
use crate::response::EventOutput;

use super::{Inventory, ItemRecord};

/// Find an item by id.
pub fn find_item<'a>(items: &'a [ItemRecord], item_id: &str) -> Option<&'a ItemRecord> {
    items.iter().find(|item| item.id == item_id)
}

/// Collect an item and all of its descendants, root first. Returned items are
/// clones; the source tree is untouched.
pub fn find_item_and_children(items: &[ItemRecord], root_id: &str) -> Vec<ItemRecord> {
    let mut result = Vec::new();
    let Some(root) = find_item(items, root_id) else {
        return result;
    };
    result.push(root.clone());

    let mut frontier = vec![root_id.to_string()];
    while let Some(parent_id) = frontier.pop() {
        for item in items {
            if item.parent_id.as_deref() == Some(parent_id.as_str()) {
                result.push(item.clone());
                frontier.push(item.id.clone());
            }
        }
    }

    result
}

/// Remove an item and all of its descendants from the inventory, returning
/// the removed records.
pub fn remove_item_and_children(
    inventory: &mut Inventory,
    item_id: &str,
) -> Result<Vec<ItemRecord>, CoreError> {
    let doomed = find_item_and_children(&inventory.items, item_id);
    if doomed.is_empty() {
        return Err(CoreError::ItemNotFound(item_id.to_string()));
    }

    let doomed_ids: Vec<&str> = doomed.iter().map(|item| item.id.as_str()).collect();
    inventory
        .items
        .retain(|item| !doomed_ids.contains(&item.id.as_str()));

    Ok(doomed)
}

/// Assign a fresh identity to the root of an item list and fix up direct
/// children to point at it. Returns the new root id.
pub fn remap_root_id(items: &mut [ItemRecord]) -> String {
    let new_id = uuid::Uuid::new_v4().to_string();
    if items.is_empty() {
        return new_id;
    }

    let old_id = items[0].id.clone();
    items[0].id = new_id.clone();
    for item in items.iter_mut().skip(1) {
        if item.parent_id.as_deref() == Some(old_id.as_str()) {
            item.parent_id = Some(new_id.clone());
        }
    }

    new_id
}

/// Give every item in the tree a fresh identity while preserving parent/child
/// structure. Used when cloning an offer into a buyer's inventory so ids never
/// collide between stacks or with the untouched source.
pub fn reissue_identities(items: &mut [ItemRecord]) {
    let mut replacements: HashMap<String, String> = HashMap::new();
    for item in items.iter() {
        replacements.insert(item.id.clone(), uuid::Uuid::new_v4().to_string());
    }

    for item in items.iter_mut() {
        if let Some(new_id) = replacements.get(&item.id) {
            item.id = new_id.clone();
        }
        if let Some(parent) = &item.parent_id {
            if let Some(new_parent) = replacements.get(parent) {
                item.parent_id = Some(new_parent.clone());
            }
        }
    }
}

/// Deliver item stacks into the stash. All-or-nothing: if the stash lacks
/// capacity a warning is appended and nothing is added.
///
/// `found_in_raid` is propagated from each stack's root into child items,
/// except ammo and money which never inherit the flag.
pub fn add_items_to_stash(
    inventory: &mut Inventory,
    stacks: Vec<Vec<ItemRecord>>,
    found_in_raid: bool,
    catalog: &Catalog,
    output: &mut EventOutput,
) {
    let incoming: usize = stacks.iter().map(|stack| stack.len()).sum();
    if inventory.items.len() + incoming > inventory.capacity {
        log::warn!(
            "Stash delivery of {} items refused: capacity {} reached",
            incoming,
            inventory.capacity
        );
        output.push_warning("Not enough stash space for the delivered items");
        return;
    }

    let stash_root = inventory.stash_root.clone();
    for mut stack in stacks {
        if stack.is_empty() {
            continue;
        }

        {
            let root = &mut stack[0];
            root.parent_id = Some(stash_root.clone());
            root.slot_id = Some("hideout".to_string());
            root.ensure_upd().spawned_in_session = found_in_raid;
        }

        for item in stack.iter_mut().skip(1) {
            let inherits = catalog
                .item(&item.tpl)
                .map(|tpl| !matches!(tpl.kind, ItemKind::Ammo | ItemKind::Money))
                .unwrap_or(true);
            if inherits {
                item.ensure_upd().spawned_in_session = found_in_raid;
            }
        }

        inventory.items.extend(stack);
    }
}
