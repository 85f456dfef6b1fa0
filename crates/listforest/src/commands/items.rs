//! Creating items and editing their text.
//!
//! Item order is never edited here; it only changes through the swap protocol
//! in [`reorder`](super::reorder).

use super::{require_editable, require_name};
use crate::effects::endpoints::Endpoints;
use crate::effects::{RequestSpec, ResponseBody};
use crate::error::{ForestError, Result};
use crate::model::{EntityPatch, ItemId, ItemPatch, NewItem, MAX_ITEMS};
use crate::normalize::{normalize_items, ItemPayload};
use crate::session::Session;
use crate::store::EntityStore;

pub fn create_item_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    new_item: &NewItem,
) -> Result<RequestSpec> {
    let list = require_editable(store.list(&new_item.list_id), new_item.list_id, session)?;
    if !(1..=MAX_ITEMS).contains(&new_item.order) {
        return Err(ForestError::validation(format!(
            "Item order must be between 1 and {}",
            MAX_ITEMS
        )));
    }
    if list.item_ids.len() >= MAX_ITEMS {
        return Err(ForestError::validation(format!(
            "The list \"{}\" already has {} items",
            list.name, MAX_ITEMS
        )));
    }
    Ok(RequestSpec::post(
        endpoints.item_collection(),
        serde_json::to_value(new_item)?,
    ))
}

/// Merges the created item and appends it to its list's slots.
pub fn apply_created_item(store: &EntityStore, body: &ResponseBody) -> Result<(EntityStore, ItemId)> {
    let payload: ItemPayload = serde_json::from_value(body.json()?.clone())?;
    let maps = normalize_items(std::slice::from_ref(&payload));
    let Some(item) = maps.items.get(&payload.id) else {
        return Err(ForestError::Transport(
            "Created item did not name its list".to_string(),
        ));
    };
    let list_id = item.list_id;
    let next = store.merge_entities(maps).append_child_id(list_id, payload.id);
    Ok((next, payload.id))
}

pub fn update_item_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: ItemId,
    patch: &ItemPatch,
) -> Result<RequestSpec> {
    let item = store.item(&id).ok_or_else(|| ForestError::not_found("item", id))?;
    require_editable(store.list(&item.list_id), item.list_id, session)?;
    if patch.order.is_some() {
        return Err(ForestError::validation(
            "Item order may not be changed. Use move up or move down instead.",
        ));
    }
    if patch.is_empty() {
        return Err(ForestError::validation("No new values have been entered for this item"));
    }
    // An item anchoring a child list must stay named.
    if let Some(name) = &patch.name {
        if store.lists().values().any(|l| l.parent_item == Some(id)) {
            require_name(name, "Item")?;
        }
    }
    Ok(RequestSpec::patch(
        endpoints.item(id),
        Some(serde_json::to_value(patch)?),
    ))
}

/// Patches the item from the server's answer, leaving its order alone.
pub fn apply_item_update(store: &EntityStore, body: &ResponseBody) -> Result<EntityStore> {
    let payload: ItemPayload = serde_json::from_value(body.json()?.clone())?;
    let maps = normalize_items(std::slice::from_ref(&payload));
    let patch = match maps.items.get(&payload.id) {
        Some(item) => ItemPatch {
            order: None,
            ..ItemPatch::from_item(item)
        },
        None => ItemPatch {
            name: Some(payload.name.clone()),
            description: Some(payload.description.clone()),
            modified_at: payload.modified_at,
            ..Default::default()
        },
    };
    let next = if maps.reusable_items.is_empty() {
        store.clone()
    } else {
        store.merge_entities(crate::normalize::EntityMaps {
            reusable_items: maps.reusable_items,
            ..Default::default()
        })
    };
    Ok(next.patch_entity(EntityPatch::Item(payload.id, patch)))
}
