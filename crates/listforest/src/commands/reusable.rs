//! Search suggestions and shared reusable items.
//!
//! A reusable item is shared by everyone whose items reference it, so changes
//! to it carry extra steps:
//!
//! - Making a private reusable item public, or a public one private, is
//!   confirmed first. Privatizing *forks*: the server answers with a new
//!   private copy, and this user's items are repointed to it while everyone
//!   else keeps the public original.
//! - Editing a reusable item that more owners use than
//!   `ForestConfig::usage_warning_threshold` is confirmed first, since the
//!   change becomes a proposal to the other users.

use serde_json::json;

use crate::effects::endpoints::Endpoints;
use crate::effects::{RequestSpec, ResponseBody};
use crate::error::{ForestError, Result};
use crate::model::{Item, ReusableItem, ReusableItemId, ReusableItemPatch};
use crate::normalize::{normalize_item_value, normalize_reusable_value, EntityMaps};
use crate::session::Session;
use crate::store::EntityStore;
use crate::views::suggestions::usage_count;

use super::{require_name, Confirmation};

/// The two searches feeding the suggestion list: reusable items, then items
/// not yet linked to one. `None` for an empty term.
pub fn search_requests(
    endpoints: &Endpoints,
    session: &Session,
    term: &str,
) -> Option<(RequestSpec, RequestSpec)> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    Some((
        // reusable items in search results are all public
        RequestSpec::get(endpoints.search_reusable_items(term)),
        RequestSpec::get(endpoints.search_items(term)).with_auth(session.is_authenticated),
    ))
}

/// Stores both result sets for `term`. Dropped if a newer search began since.
pub fn apply_search_results(
    store: &EntityStore,
    term: &str,
    reusable_body: &ResponseBody,
    items_body: &ResponseBody,
) -> Result<EntityStore> {
    let reusable = normalize_reusable_value(reusable_body.json()?)?.entities;
    let found = normalize_item_value(items_body.json()?)?.entities;

    let mut reusable_items: Vec<ReusableItem> = reusable.reusable_items.into_values().collect();
    reusable_items.sort_by(|a, b| a.id.cmp(&b.id));
    let mut items: Vec<Item> = found.items.into_values().collect();
    items.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(store.receive_search_results(term, reusable_items, items))
}

fn require_reusable(store: &EntityStore, id: ReusableItemId) -> Result<&ReusableItem> {
    store
        .reusable_item(&id)
        .ok_or_else(|| ForestError::not_found("reusable item", id))
}

/// The question to ask before changing visibility, or an error if nothing
/// would change.
pub fn visibility_confirmation(
    store: &EntityStore,
    id: ReusableItemId,
    is_public: bool,
) -> Result<Confirmation> {
    let reusable = require_reusable(store, id)?;
    match (reusable.is_public, is_public) {
        (false, true) => Ok(Confirmation::MakeReusableItemPublic { reusable_item: id }),
        (true, false) => Ok(Confirmation::MakeReusableItemPrivate { reusable_item: id }),
        (_, is_public) => Err(ForestError::validation(format!(
            "This reusable item is already {}",
            if is_public { "public" } else { "private" }
        ))),
    }
}

pub fn set_reusable_public_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: ReusableItemId,
    is_public: bool,
) -> Result<RequestSpec> {
    let user = session
        .user()
        .ok_or_else(|| ForestError::validation("You must be logged in to change a reusable item"))?;
    let reusable = require_reusable(store, id)?;
    if is_public && reusable.created_by != Some(user) {
        return Err(ForestError::validation(
            "Only the creator of a private reusable item can make it public",
        ));
    }
    visibility_confirmation(store, id, is_public)?;
    Ok(RequestSpec::patch(
        endpoints.reusable_item(id),
        Some(json!({ "is_public": is_public })),
    ))
}

/// Applies a visibility change. When the server answers with a different id
/// the original was forked, and the session user's items move to the copy.
pub fn apply_reusable_visibility(
    store: &EntityStore,
    session: &Session,
    original: ReusableItemId,
    body: &ResponseBody,
) -> Result<(EntityStore, ReusableItemId)> {
    let reusable: ReusableItem = serde_json::from_value(body.json()?.clone())?;
    let id = reusable.id;
    let mut maps = EntityMaps::default().with_reusable_item(reusable);

    if id != original {
        tracing::debug!(%original, fork = %id, "reusable item forked");
        let user = session.user();
        let repointed = store
            .items()
            .values()
            .filter(|item| item.reusable_item_id == Some(original))
            .filter(|item| {
                store
                    .list(&item.list_id)
                    .is_some_and(|list| list.created_by.is_some() && list.created_by == user)
            })
            .map(|item| Item {
                reusable_item_id: Some(id),
                ..item.clone()
            });
        for item in repointed {
            maps.items.insert(item.id, item);
        }
    }
    Ok((store.merge_entities(maps), id))
}

/// Asks before editing a reusable item used by more owners than `threshold`.
pub fn edit_confirmation(
    store: &EntityStore,
    id: ReusableItemId,
    threshold: usize,
) -> Option<Confirmation> {
    let users = usage_count(id, store.items().as_map(), store.lists().as_map());
    (users > threshold).then_some(Confirmation::EditSharedReusableItem {
        reusable_item: id,
        users,
    })
}

pub fn update_reusable_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    id: ReusableItemId,
    patch: &ReusableItemPatch,
) -> Result<RequestSpec> {
    if session.user().is_none() {
        return Err(ForestError::validation(
            "You must be logged in to change a reusable item",
        ));
    }
    require_reusable(store, id)?;
    if patch.is_public.is_some() {
        return Err(ForestError::validation(
            "Use the visibility setting to make a reusable item public or private",
        ));
    }
    if patch.is_empty() {
        return Err(ForestError::validation(
            "No new values have been entered for this reusable item",
        ));
    }
    if let Some(name) = &patch.name {
        require_name(name, "Reusable item")?;
    }
    Ok(RequestSpec::patch(
        endpoints.reusable_item(id),
        Some(serde_json::to_value(patch)?),
    ))
}

/// Merges the server's copy. A change to a shared item may come back as a
/// proposed modification rather than new values.
pub fn apply_reusable_update(store: &EntityStore, body: &ResponseBody) -> Result<EntityStore> {
    let reusable: ReusableItem = serde_json::from_value(body.json()?.clone())?;
    Ok(store.merge_entities(EntityMaps::default().with_reusable_item(reusable)))
}

pub fn fetch_reusable_request(endpoints: &Endpoints, session: &Session, id: ReusableItemId) -> RequestSpec {
    RequestSpec::get(endpoints.reusable_item(id)).with_auth(session.is_authenticated)
}

pub fn apply_reusable_detail(store: &EntityStore, body: &ResponseBody) -> Result<EntityStore> {
    apply_reusable_update(store, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;
    use crate::store::fixtures::ForestFixture;

    fn endpoints() -> Endpoints {
        Endpoints::new("/api/v1/content/")
    }

    #[test]
    fn test_search_requests_encode_term() {
        let (reusable, items) =
            search_requests(&endpoints(), &Session::anonymous(), "tig er").unwrap();
        assert_eq!(reusable.endpoint, "/api/v1/content/searchreusableitems/?search=tig+er");
        assert!(!reusable.requires_auth);
        assert!(items.endpoint.contains("excludereusableitems=true"));
        assert!(search_requests(&endpoints(), &Session::anonymous(), " ").is_none());
    }

    #[test]
    fn test_apply_search_results_feeds_suggestions() {
        let store = EntityStore::new().begin_search("tig", None);
        let tiger = ReusableItem::new("Tiger");
        let list = crate::model::ListId::new();
        let reusable_body = ResponseBody::Json(json!([tiger]));
        let items_body = ResponseBody::Json(json!({
            "count": 1, "next": null, "previous": null,
            "results": [{ "id": crate::model::ItemId::new(), "list_id": list, "order": 1, "name": "Tigris" }]
        }));

        let next = apply_search_results(&store, "tig", &reusable_body, &items_body).unwrap();
        assert_eq!(next.search().reusable_items.len(), 1);
        assert_eq!(next.search().items[0].name, "Tigris");

        let stale = apply_search_results(&store, "ti", &reusable_body, &items_body).unwrap();
        assert!(stale.search().items.is_empty());
    }

    #[test]
    fn test_visibility_confirmation_texts() {
        let fx = ForestFixture::new()
            .with_list("Rivers", &["Nile"])
            .with_reusable_item("Nile", "Nile");
        let store = fx.store();
        let id = fx.reusable("Nile").id;
        assert_eq!(
            visibility_confirmation(&store, id, false).unwrap(),
            Confirmation::MakeReusableItemPrivate { reusable_item: id }
        );
        assert!(visibility_confirmation(&store, id, true).is_err());
    }

    #[test]
    fn test_make_public_needs_creator() {
        let fx = ForestFixture::new()
            .with_list("Rivers", &["Nile"])
            .with_reusable_item("Nile", "Nile");
        let id = fx.reusable("Nile").id;
        let store = fx.store().patch_entity(crate::model::EntityPatch::ReusableItem(
            id,
            ReusableItemPatch {
                is_public: Some(false),
                ..Default::default()
            },
        ));
        let stranger = Session::logged_in(UserId::new(), "bob", true);
        assert!(set_reusable_public_request(&endpoints(), &store, &stranger, id, true).is_err());
        let owner = Session::logged_in(fx.owner(), "owner", true);
        let spec = set_reusable_public_request(&endpoints(), &store, &owner, id, true).unwrap();
        assert_eq!(spec.payload, Some(json!({ "is_public": true })));
    }

    #[test]
    fn test_fork_repoints_only_own_items() {
        let stranger = UserId::new();
        let fx = ForestFixture::new()
            .with_list("Mine", &["Nile"])
            .with_foreign_list("Theirs", stranger, true, &["Le Nil"])
            .with_reusable_item("Nile", "Nile")
            .with_reusable_item("Le Nil", "Nile");
        let original = fx.reusable("Nile");
        let mut fork = original.clone();
        fork.id = ReusableItemId::new();
        fork.is_public = false;
        let session = Session::logged_in(fx.owner(), "owner", true);

        let body = ResponseBody::Json(serde_json::to_value(&fork).unwrap());
        let (next, id) = apply_reusable_visibility(&fx.store(), &session, original.id, &body).unwrap();
        assert_eq!(id, fork.id);
        assert_eq!(next.item(&fx.item_id("Nile")).unwrap().reusable_item_id, Some(fork.id));
        assert_eq!(next.item(&fx.item_id("Le Nil")).unwrap().reusable_item_id, Some(original.id));
        assert!(next.reusable_item(&original.id).unwrap().is_public);
    }

    #[test]
    fn test_edit_confirmation_threshold() {
        let stranger = UserId::new();
        let fx = ForestFixture::new()
            .with_list("Mine", &["Nile"])
            .with_foreign_list("Theirs", stranger, true, &["Le Nil"])
            .with_reusable_item("Nile", "Nile")
            .with_reusable_item("Le Nil", "Nile");
        let id = fx.reusable("Nile").id;
        assert_eq!(
            edit_confirmation(&fx.store(), id, 1),
            Some(Confirmation::EditSharedReusableItem { reusable_item: id, users: 2 })
        );
        assert_eq!(edit_confirmation(&fx.store(), id, 2), None);
    }

    #[test]
    fn test_update_rejects_visibility_and_blank_name() {
        let fx = ForestFixture::new()
            .with_list("Rivers", &["Nile"])
            .with_reusable_item("Nile", "Nile");
        let session = Session::logged_in(fx.owner(), "owner", true);
        let id = fx.reusable("Nile").id;
        let store = fx.store();

        let visibility = ReusableItemPatch {
            is_public: Some(false),
            ..Default::default()
        };
        assert!(update_reusable_request(&endpoints(), &store, &session, id, &visibility).is_err());
        let blank = ReusableItemPatch {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(update_reusable_request(&endpoints(), &store, &session, id, &blank).is_err());
        let definition = ReusableItemPatch {
            definition: Some("Longest river".to_string()),
            ..Default::default()
        };
        let spec = update_reusable_request(&endpoints(), &store, &session, id, &definition).unwrap();
        assert_eq!(spec.payload, Some(json!({ "definition": "Longest river" })));
    }
}
