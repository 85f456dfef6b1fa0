//! Fetching, marking and deleting notifications.

use serde_json::Value;

use crate::effects::endpoints::Endpoints;
use crate::effects::{RequestSpec, ResponseBody};
use crate::error::{ForestError, Result};
use crate::model::{EntityPatch, EntityRef, Notification, NotificationId, NotificationPatch};
use crate::session::Session;
use crate::store::EntityStore;

fn require_login(session: &Session) -> Result<()> {
    if session.user().is_none() {
        return Err(ForestError::validation(
            "You must be logged in to see notifications",
        ));
    }
    Ok(())
}

pub fn fetch_request(endpoints: &Endpoints, session: &Session) -> Result<RequestSpec> {
    require_login(session)?;
    Ok(RequestSpec::get(endpoints.notifications()).with_auth(true))
}

/// Replaces the stored notifications. Accepts a bare array or a paginated
/// envelope.
pub fn apply_notifications(store: &EntityStore, body: &ResponseBody) -> Result<EntityStore> {
    let records = match body.json()? {
        Value::Object(fields) => fields.get("results").cloned().unwrap_or(Value::Null),
        other => other.clone(),
    };
    let notifications: Vec<Notification> = match records {
        Value::Null => Vec::new(),
        records => serde_json::from_value(records)?,
    };
    Ok(store.receive_notifications(notifications))
}

fn read_patch() -> NotificationPatch {
    NotificationPatch {
        new: Some(false),
        unread: Some(false),
    }
}

pub fn mark_read_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: NotificationId,
) -> Result<RequestSpec> {
    require_login(session)?;
    if !store.notifications().contains(&id) {
        return Err(ForestError::not_found("notification", id));
    }
    Ok(RequestSpec::patch(
        endpoints.notification(id),
        Some(serde_json::to_value(read_patch())?),
    ))
}

pub fn apply_mark_read(store: &EntityStore, id: NotificationId) -> EntityStore {
    store.patch_entity(EntityPatch::Notification(id, read_patch()))
}

pub fn delete_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: NotificationId,
) -> Result<RequestSpec> {
    require_login(session)?;
    if !store.notifications().contains(&id) {
        return Err(ForestError::not_found("notification", id));
    }
    Ok(RequestSpec::delete(endpoints.notification(id)))
}

pub fn apply_deleted(store: &EntityStore, id: NotificationId) -> EntityStore {
    store.remove_entity(EntityRef::Notification(id))
}
