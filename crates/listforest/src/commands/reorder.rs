//! Pairwise swap of neighbouring items.
//!
//! The server knows one reorder operation: move an item up one slot, swapping
//! it with its predecessor. It answers with both affected items carrying their
//! new orders, and [`EntityStore::swap_pair`] places them by those orders.
//!
//! Moving down is moving the successor up:
//!
//! ```text
//! before          move_down(b)  ==  move_up(c)          after
//! [a, b, c, d]    ----------------------------->        [a, c, b, d]
//! ```
//!
//! Both directions require a named item. Unnamed slots never move, and the
//! slot below an item must hold a loaded, named item before it can move down.

use serde::Serialize;

use super::require_editable;
use crate::effects::endpoints::Endpoints;
use crate::effects::{RequestSpec, ResponseBody};
use crate::error::{ForestError, Result};
use crate::model::{Item, ItemId, MAX_ITEMS};
use crate::normalize::{normalize_items, ItemPayload};
use crate::session::Session;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// The item the server must move up to carry out `direction` on `id`.
fn move_target(store: &EntityStore, id: ItemId, direction: MoveDirection) -> Result<ItemId> {
    let item = store.item(&id).ok_or_else(|| ForestError::not_found("item", id))?;
    if item.is_placeholder() {
        return Err(ForestError::validation("An unnamed item cannot be moved"));
    }
    match direction {
        MoveDirection::Up => {
            if item.order <= 1 {
                return Err(ForestError::validation("The first item cannot be moved up"));
            }
            Ok(id)
        }
        MoveDirection::Down => {
            if item.order >= MAX_ITEMS {
                return Err(ForestError::validation("The last item cannot be moved down"));
            }
            let successor = store
                .list(&item.list_id)
                .and_then(|list| list.item_at(item.order + 1))
                .and_then(|next| store.item(&next))
                .filter(|next| !next.is_placeholder());
            match successor {
                Some(next) => Ok(next.id),
                None => Err(ForestError::validation(
                    "There is no named item below this one to swap with",
                )),
            }
        }
    }
}

/// Whether `id` may move in `direction`; drives which arrows are offered.
pub fn can_move(store: &EntityStore, id: ItemId, direction: MoveDirection) -> bool {
    move_target(store, id, direction).is_ok()
}

fn move_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: ItemId,
    direction: MoveDirection,
) -> Result<RequestSpec> {
    let item = store.item(&id).ok_or_else(|| ForestError::not_found("item", id))?;
    require_editable(store.list(&item.list_id), item.list_id, session)?;
    let target = move_target(store, id, direction)?;
    tracing::debug!(item = %id, target = %target, ?direction, "moving item");
    Ok(RequestSpec::patch(endpoints.move_up(target), None))
}

pub fn move_up_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: ItemId,
) -> Result<RequestSpec> {
    move_request(endpoints, store, session, id, MoveDirection::Up)
}

pub fn move_down_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: ItemId,
) -> Result<RequestSpec> {
    move_request(endpoints, store, session, id, MoveDirection::Down)
}

/// Applies the server's answer to a move up: exactly the two swapped items.
/// Returns the new snapshot and the ids of both items.
pub fn apply_move_up(store: &EntityStore, body: &ResponseBody) -> Result<(EntityStore, [ItemId; 2])> {
    let payloads: Vec<ItemPayload> = serde_json::from_value(body.json()?.clone())?;
    if payloads.len() != 2 {
        return Err(ForestError::Transport(format!(
            "Unexpected move up response: expected 2 items, got {}",
            payloads.len()
        )));
    }
    let mut maps = normalize_items(&payloads);
    let mut swapped: Vec<Item> = payloads
        .iter()
        .filter_map(|payload| maps.items.remove(&payload.id))
        .collect();
    let (Some(b), Some(a)) = (swapped.pop(), swapped.pop()) else {
        return Err(ForestError::Transport(
            "Unexpected move up response: items without a list".to_string(),
        ));
    };
    let ids = [a.id, b.id];
    Ok((store.swap_pair(a, b), ids))
}
