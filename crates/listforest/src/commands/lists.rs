//! Fetching, creating, editing and deleting lists.
//!
//! A page fetch *replaces* the store's lists, items and reusable items: moving
//! between "my lists" and "public lists" must not leave the previous view's
//! entries behind. A detail fetch *merges*, since it only adds to what the
//! current view already shows.

use serde::Serialize;
use serde_json::json;

use super::{require_editable, require_name};
use crate::effects::endpoints::{Endpoints, ListQuery};
use crate::effects::{RequestSpec, ResponseBody};
use crate::error::{ForestError, Result};
use crate::model::{
    EntityKind, EntityPatch, EntityRef, ItemId, ListId, ListPatch, NewList, ReusableItemId,
    SlotChoice, SlotDraft,
};
use crate::normalize::{normalize_list, normalize_value, ListPayload};
use crate::permissions::can_create_list;
use crate::session::Session;
use crate::store::EntityStore;

pub fn fetch_lists_request(endpoints: &Endpoints, query: &ListQuery, session: &Session) -> RequestSpec {
    RequestSpec::get(endpoints.lists(query)).with_auth(session.is_authenticated)
}

/// Replaces the store's entities with one page of lists.
pub fn apply_lists_page(store: &EntityStore, body: &ResponseBody) -> Result<EntityStore> {
    let normalized = normalize_value(body.json()?)?;
    let next = store.replace_entities(normalized.entities);
    Ok(match normalized.page {
        Some(page) => next.set_page(page),
        None => next,
    })
}

pub fn fetch_list_detail_request(endpoints: &Endpoints, id: ListId, session: &Session) -> RequestSpec {
    RequestSpec::get(endpoints.list_detail(id)).with_auth(session.is_authenticated)
}

pub fn fetch_list_by_slug_request(
    endpoints: &Endpoints,
    slug: &str,
    session: &Session,
) -> Result<RequestSpec> {
    if slug.trim().is_empty() {
        return Err(ForestError::validation("List slug must not be empty"));
    }
    Ok(RequestSpec::get(endpoints.list_by_slug(slug)).with_auth(session.is_authenticated))
}

/// Merges a list detail response: the list, its items and, for each item,
/// its reusable item and child list.
pub fn apply_list_detail(store: &EntityStore, body: &ResponseBody) -> Result<EntityStore> {
    let normalized = normalize_value(body.json()?)?;
    Ok(store
        .merge_entities(normalized.entities)
        .set_loading(EntityKind::List, false))
}

#[derive(Debug, Serialize)]
struct SlotPayload<'a> {
    order: usize,
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    new_reusable_item: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reusable_item_id: Option<ReusableItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_id: Option<ItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reusable_item_definition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reusable_item_link: Option<&'a str>,
}

impl<'a> SlotPayload<'a> {
    fn new(order: usize, draft: &'a SlotDraft) -> Self {
        let mut payload = SlotPayload {
            order,
            name: draft.name.trim(),
            description: &draft.description,
            new_reusable_item: false,
            reusable_item_id: None,
            item_id: None,
            reusable_item_definition: None,
            reusable_item_link: None,
        };
        match &draft.choice {
            SlotChoice::Text => {}
            SlotChoice::NewReusableItem { definition, link } => {
                payload.new_reusable_item = true;
                payload.reusable_item_definition = Some(definition.as_str());
                payload.reusable_item_link = Some(link.as_str());
            }
            SlotChoice::ReusableItem { id } => payload.reusable_item_id = Some(*id),
            SlotChoice::Item { id } => payload.item_id = Some(*id),
        }
        payload
    }
}

/// Builds the create request. The server creates all slots; drafts fill the
/// named ones.
pub fn create_list_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    new_list: &NewList,
) -> Result<RequestSpec> {
    if !can_create_list(session) {
        return Err(ForestError::validation(
            "You must be logged in with a verified email address to create a list",
        ));
    }
    require_name(&new_list.name, "List")?;

    if let Some(parent) = new_list.parent_item {
        let item = store
            .item(&parent)
            .ok_or_else(|| ForestError::not_found("item", parent))?;
        require_editable(store.list(&item.list_id), item.list_id, session)?;
        if item.is_placeholder() {
            return Err(ForestError::validation(
                "A list can only be created under a named item",
            ));
        }
    }

    let slots = new_list.slots.to_slots();
    for (order, draft) in &slots {
        if draft.name.trim().is_empty() && draft.choice != SlotChoice::Text {
            return Err(ForestError::validation(format!(
                "Item {} needs a name before it can use a reusable item",
                order
            )));
        }
    }
    let items: Vec<SlotPayload> = slots
        .iter()
        .map(|(order, draft)| SlotPayload::new(*order, draft))
        .collect();

    let mut payload = json!({
        "name": new_list.name.trim(),
        "description": new_list.description,
        "is_public": new_list.is_public,
        "item": serde_json::to_value(items)?,
    });
    if let Some(parent) = new_list.parent_item {
        payload["parent_item_id"] = json!(parent);
    }
    Ok(RequestSpec::post(endpoints.list_collection(), payload))
}

/// Merges the created list and returns its id.
pub fn apply_created_list(store: &EntityStore, body: &ResponseBody) -> Result<(EntityStore, ListId)> {
    let payload: ListPayload = serde_json::from_value(body.json()?.clone())?;
    let id = payload.id;
    let next = store.merge_entities(normalize_list(&payload));
    Ok((next, id))
}

/// Edits plain list fields. Reparenting goes through the organizer instead,
/// where the forest is checked for cycles.
pub fn update_list_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: ListId,
    patch: &ListPatch,
) -> Result<RequestSpec> {
    require_editable(store.list(&id), id, session)?;
    if patch.parent_item.is_some() {
        return Err(ForestError::validation(
            "Use the organizer to change the parent of a list",
        ));
    }
    if patch.is_empty() {
        return Err(ForestError::validation("No new values have been entered for this list"));
    }
    if let Some(name) = &patch.name {
        require_name(name, "List")?;
    }
    Ok(RequestSpec::patch(
        endpoints.list(id),
        Some(serde_json::to_value(patch)?),
    ))
}

/// Patches the editable fields the server echoed back, leaving slots and
/// parent untouched.
pub fn apply_list_update(store: &EntityStore, body: &ResponseBody) -> Result<EntityStore> {
    let payload: ListPayload = serde_json::from_value(body.json()?.clone())?;
    let id = payload.id;
    let maps = normalize_list(&payload);
    let Some(list) = maps.lists.get(&id) else {
        return Ok(store.clone());
    };
    let patch = ListPatch {
        parent_item: None,
        ..ListPatch::from_list(list)
    };
    Ok(store.patch_entity(EntityPatch::List(id, patch)))
}

pub fn set_list_public_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: ListId,
    is_public: bool,
) -> Result<RequestSpec> {
    update_list_request(endpoints, store, session, id, &ListPatch::is_public(is_public))
}

pub fn delete_list_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: ListId,
) -> Result<RequestSpec> {
    require_editable(store.list(&id), id, session)?;
    Ok(RequestSpec::delete(endpoints.list(id)))
}

/// Drops the list. Its items and any child lists stay; child links resolve to
/// nothing from now on.
pub fn apply_list_deleted(store: &EntityStore, id: ListId) -> EntityStore {
    store.remove_entity(EntityRef::List(id))
}
