//! # Entity Store
//!
//! The store is an immutable snapshot of everything the client knows: one
//! [`Collection`] per entity type, the organizer projection, and the current
//! search results.
//!
//! ## Transitions
//!
//! Every change is a transition: a method that takes `&self` and returns a new
//! [`EntityStore`]. Nothing is mutated in place. Collections share their maps
//! through `Arc`, so a transition that touches lists does not copy items, and
//! an old snapshot held by a caller keeps seeing exactly what it saw before.
//!
//! | Transition | Effect |
//! |---|---|
//! | [`merge_entities`](EntityStore::merge_entities) | Overwrite by id, keep the rest |
//! | [`replace_entities`](EntityStore::replace_entities) | Clear lists, items and reusable items, then insert |
//! | [`patch_entity`](EntityStore::patch_entity) | Overwrite named fields of one entity |
//! | [`append_child_id`](EntityStore::append_child_id) | Add an item id to a list's slots |
//! | [`swap_pair`](EntityStore::swap_pair) | Apply a server-confirmed reorder |
//! | [`set_parent_item`](EntityStore::set_parent_item) | Reparent a list, disconnecting any previous child |
//! | [`remove_entity`](EntityStore::remove_entity) | Drop one entity, no cascade |
//! | [`reset_all`](EntityStore::reset_all) | Back to the empty snapshot |
//!
//! ## Failure Semantics
//!
//! Transitions never fail. A patch aimed at an unknown id leaves the snapshot
//! unchanged and logs a warning. Structural problems (a list missing slots, a
//! cycle in the forest) are not prevented here; [`doctor::check_consistency`]
//! reports them.
//!
//! ## Revisions
//!
//! Each collection carries a revision stamp that changes whenever its entities
//! change. The view cache compares stamps to decide whether a derived view
//! must be recomputed.

use crate::model::{
    EntityKind, EntityPatch, EntityRef, Item, ItemId, List, ListId, Notification,
    NotificationId, ReusableItem, ReusableItemId,
};
use crate::normalize::{EntityMaps, PageMeta};

pub mod collection;
pub mod doctor;

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures;

pub use collection::{Collection, LoadMeta};

/// Minimal copy of the owner's forest loaded for the organizer.
///
/// Kept apart from the main collections so opening the organizer never
/// disturbs the lists on screen.
#[derive(Debug, Clone, Default)]
pub struct OrganizerData {
    pub lists: Collection<ListId, List>,
    pub items: Collection<ItemId, Item>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub term: String,
    pub widget_id: Option<String>,
    pub reusable_items: Vec<ReusableItem>,
    pub items: Vec<Item>,
    pub revision: u64,
}

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    lists: Collection<ListId, List>,
    items: Collection<ItemId, Item>,
    reusable_items: Collection<ReusableItemId, ReusableItem>,
    notifications: Collection<NotificationId, Notification>,
    organizer: OrganizerData,
    search: SearchResults,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Reads ---

    pub fn lists(&self) -> &Collection<ListId, List> {
        &self.lists
    }

    pub fn items(&self) -> &Collection<ItemId, Item> {
        &self.items
    }

    pub fn reusable_items(&self) -> &Collection<ReusableItemId, ReusableItem> {
        &self.reusable_items
    }

    pub fn notifications(&self) -> &Collection<NotificationId, Notification> {
        &self.notifications
    }

    pub fn organizer(&self) -> &OrganizerData {
        &self.organizer
    }

    pub fn search(&self) -> &SearchResults {
        &self.search
    }

    pub fn list(&self, id: &ListId) -> Option<&List> {
        self.lists.get(id)
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn reusable_item(&self, id: &ReusableItemId) -> Option<&ReusableItem> {
        self.reusable_items.get(id)
    }

    pub fn is_loading(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::List => self.lists.meta.is_loading,
            EntityKind::Item => self.items.meta.is_loading,
            EntityKind::ReusableItem => self.reusable_items.meta.is_loading,
            EntityKind::Notification => self.notifications.meta.is_loading,
        }
    }

    // --- Transitions ---

    pub fn merge_entities(&self, maps: EntityMaps) -> Self {
        tracing::debug!(
            lists = maps.lists.len(),
            items = maps.items.len(),
            reusable_items = maps.reusable_items.len(),
            "merging entities"
        );
        let mut next = self.clone();
        if !maps.lists.is_empty() {
            next.lists = self.lists.merged(maps.lists);
        }
        if !maps.items.is_empty() {
            next.items = self.items.merged(maps.items);
        }
        if !maps.reusable_items.is_empty() {
            next.reusable_items = self.reusable_items.merged(maps.reusable_items);
        }
        next
    }

    /// Replaces lists, items and reusable items wholesale. The organizer
    /// projection is cleared too; it must be reloaded against the new data.
    pub fn replace_entities(&self, maps: EntityMaps) -> Self {
        tracing::debug!(lists = maps.lists.len(), "replacing entities");
        let mut next = self.clone();
        next.lists = self.lists.replaced(maps.lists);
        next.lists.meta.is_loading = false;
        next.items = self.items.replaced(maps.items);
        next.items.meta.is_loading = false;
        next.reusable_items = self.reusable_items.replaced(maps.reusable_items);
        next.reusable_items.meta.is_loading = false;
        next.organizer = OrganizerData::default();
        next
    }

    pub fn patch_entity(&self, patch: EntityPatch) -> Self {
        let mut next = self.clone();
        let applied = match patch {
            EntityPatch::List(id, fields) => patch_in(&self.lists, &mut next.lists, &id, |l| {
                fields.apply(l)
            }),
            EntityPatch::Item(id, fields) => patch_in(&self.items, &mut next.items, &id, |i| {
                fields.apply(i)
            }),
            EntityPatch::ReusableItem(id, fields) => {
                patch_in(&self.reusable_items, &mut next.reusable_items, &id, |r| {
                    fields.apply(r)
                })
            }
            EntityPatch::Notification(id, fields) => {
                patch_in(&self.notifications, &mut next.notifications, &id, |n| {
                    fields.apply(n)
                })
            }
        };
        if let Err(id) = applied {
            tracing::warn!(%id, "patch ignored: no such entity");
        }
        next
    }

    pub fn append_child_id(&self, list_id: ListId, item_id: ItemId) -> Self {
        let Some(list) = self.lists.get(&list_id) else {
            tracing::warn!(list = %list_id, "append ignored: no such list");
            return self.clone();
        };
        if list.item_ids.contains(&item_id) {
            return self.clone();
        }
        let mut next = self.clone();
        next.lists = self.lists.update(|lists| {
            if let Some(list) = lists.get_mut(&list_id) {
                list.item_ids.push(item_id);
            }
        });
        next
    }

    /// Applies both items of a server-confirmed swap.
    ///
    /// Each item lands in its owning list at `order - 1`, using the order the
    /// server returned rather than any position the client guessed.
    pub fn swap_pair(&self, a: Item, b: Item) -> Self {
        tracing::debug!(a = %a.id, b = %b.id, "applying swap");
        let placements: Vec<(ListId, usize, ItemId)> = [&a, &b]
            .iter()
            .filter_map(|item| item.slot().map(|slot| (item.list_id, slot, item.id)))
            .collect();

        let mut next = self.clone();
        next.items = self.items.merged([(a.id, a), (b.id, b)]);
        next.lists = self.lists.update(|lists| {
            for (list_id, slot, item_id) in placements {
                match lists.get_mut(&list_id) {
                    Some(list) if slot < list.item_ids.len() => list.item_ids[slot] = item_id,
                    Some(_) => tracing::warn!(list = %list_id, slot, "swap slot out of range"),
                    None => {}
                }
            }
        });
        next
    }

    pub fn remove_entity(&self, entity: EntityRef) -> Self {
        let mut next = self.clone();
        match entity {
            EntityRef::List(id) => {
                next.lists = self.lists.update(|m| {
                    m.remove(&id);
                });
                if self.organizer.lists.contains(&id) {
                    next.organizer.lists = self.organizer.lists.update(|m| {
                        m.remove(&id);
                    });
                }
            }
            EntityRef::Item(id) => {
                next.items = self.items.update(|m| {
                    m.remove(&id);
                });
            }
            EntityRef::ReusableItem(id) => {
                next.reusable_items = self.reusable_items.update(|m| {
                    m.remove(&id);
                });
            }
            EntityRef::Notification(id) => {
                next.notifications = self.notifications.update(|m| {
                    m.remove(&id);
                });
            }
        }
        next
    }

    /// Sets `list_id`'s parent item. Any other list anchored at the same item
    /// is disconnected, in the main collection and the organizer projection.
    pub fn set_parent_item(&self, list_id: ListId, parent: Option<ItemId>) -> Self {
        tracing::debug!(list = %list_id, parent = ?parent, "setting parent item");
        let reparent = |lists: &mut std::collections::HashMap<ListId, List>| {
            for list in lists.values_mut() {
                if list.id == list_id {
                    list.parent_item = parent;
                } else if parent.is_some() && list.parent_item == parent {
                    tracing::debug!(list = %list.id, "disconnecting previous child");
                    list.parent_item = None;
                }
            }
        };

        let mut next = self.clone();
        next.lists = self.lists.update(reparent);
        if !self.organizer.lists.is_empty() {
            next.organizer.lists = self.organizer.lists.update(reparent);
        }
        next
    }

    /// Loads the organizer projection. Unnamed items are kept: they cannot
    /// be chosen as parents, but lists already hanging under them must stay
    /// reachable when walking the forest.
    pub fn receive_organizer_data(&self, maps: EntityMaps) -> Self {
        let mut next = self.clone();
        next.organizer = OrganizerData {
            lists: self.organizer.lists.replaced(maps.lists),
            items: self.organizer.items.replaced(maps.items),
        };
        next
    }

    pub fn receive_notifications(&self, notifications: Vec<Notification>) -> Self {
        let mut next = self.clone();
        next.notifications = self
            .notifications
            .replaced(notifications.into_iter().map(|n| (n.id, n)));
        next.notifications.meta.is_loading = false;
        next
    }

    pub fn begin_search(&self, term: impl Into<String>, widget_id: Option<String>) -> Self {
        let mut next = self.clone();
        next.search = SearchResults {
            term: term.into(),
            widget_id,
            reusable_items: Vec::new(),
            items: Vec::new(),
            revision: collection::next_revision(),
        };
        next
    }

    /// Stores results for `term`. Results for a term other than the current
    /// one are stale and dropped.
    pub fn receive_search_results(
        &self,
        term: &str,
        reusable_items: Vec<ReusableItem>,
        items: Vec<Item>,
    ) -> Self {
        if term != self.search.term {
            tracing::debug!(term, current = %self.search.term, "dropping stale search results");
            return self.clone();
        }
        let mut next = self.clone();
        next.search.reusable_items = reusable_items;
        next.search.items = items;
        next.search.revision = collection::next_revision();
        next
    }

    pub fn clear_search(&self) -> Self {
        let mut next = self.clone();
        next.search = SearchResults {
            revision: collection::next_revision(),
            ..Default::default()
        };
        next
    }

    pub fn set_loading(&self, kind: EntityKind, is_loading: bool) -> Self {
        let mut next = self.clone();
        let with = |meta: &LoadMeta| LoadMeta {
            is_loading,
            page: meta.page.clone(),
        };
        match kind {
            EntityKind::List => next.lists = self.lists.with_meta(with(&self.lists.meta)),
            EntityKind::Item => next.items = self.items.with_meta(with(&self.items.meta)),
            EntityKind::ReusableItem => {
                next.reusable_items =
                    self.reusable_items.with_meta(with(&self.reusable_items.meta))
            }
            EntityKind::Notification => {
                next.notifications = self.notifications.with_meta(with(&self.notifications.meta))
            }
        }
        next
    }

    /// Records pagination for the list collection.
    pub fn set_page(&self, page: PageMeta) -> Self {
        let mut next = self.clone();
        next.lists = self.lists.with_meta(LoadMeta {
            is_loading: self.lists.meta.is_loading,
            page,
        });
        next
    }

    pub fn reset_all(&self) -> Self {
        tracing::debug!("resetting store");
        Self::default()
    }
}

fn patch_in<K, V>(
    current: &Collection<K, V>,
    target: &mut Collection<K, V>,
    id: &K,
    apply: impl FnOnce(&mut V),
) -> std::result::Result<(), String>
where
    K: Eq + std::hash::Hash + Clone + std::fmt::Display,
    V: Clone,
{
    if !current.contains(id) {
        return Err(id.to_string());
    }
    *target = current.update(|things| {
        if let Some(entity) = things.get_mut(id) {
            apply(entity);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::fixtures::ForestFixture;
    use super::*;
    use crate::model::{ItemPatch, ListPatch, MAX_ITEMS};

    #[test]
    fn test_merge_overwrites_by_id_and_keeps_rest() {
        let fx = ForestFixture::new().with_list("Rivers", &["Nile", "Amazon"]);
        let store = fx.store();
        let list_id = fx.list_id("Rivers");

        let mut renamed = store.list(&list_id).unwrap().clone();
        renamed.name = "Big rivers".to_string();
        let other = List::new("Mountains");
        let maps = EntityMaps::default().with_list(renamed).with_list(other.clone());

        let next = store.merge_entities(maps);
        assert_eq!(next.list(&list_id).unwrap().name, "Big rivers");
        assert!(next.list(&other.id).is_some());
        assert_eq!(next.items().len(), MAX_ITEMS);
        // source snapshot untouched
        assert_eq!(store.list(&list_id).unwrap().name, "Rivers");
        assert!(store.list(&other.id).is_none());
    }

    #[test]
    fn test_replace_clears_previous_entries_and_organizer() {
        let fx = ForestFixture::new().with_list("Rivers", &["Nile"]);
        let store = fx.store().receive_organizer_data(fx.organizer_maps());
        assert!(!store.organizer().lists.is_empty());

        let fresh = List::new("Public list");
        let next = store.replace_entities(EntityMaps::default().with_list(fresh.clone()));
        assert_eq!(next.lists().len(), 1);
        assert!(next.list(&fresh.id).is_some());
        assert!(next.items().is_empty());
        assert!(next.organizer().lists.is_empty());
    }

    #[test]
    fn test_patch_touches_only_named_fields() {
        let fx = ForestFixture::new().with_list("Rivers", &["Nile"]);
        let list_id = fx.list_id("Rivers");
        let store = fx.store();
        let before = store.list(&list_id).unwrap().clone();

        let next = store.patch_entity(EntityPatch::List(list_id, ListPatch::is_public(true)));
        let after = next.list(&list_id).unwrap();
        assert!(after.is_public);
        assert_eq!(after.name, before.name);
        assert_eq!(after.item_ids, before.item_ids);
    }

    #[test]
    fn test_patch_unknown_id_is_noop() {
        let store = ForestFixture::new().with_list("Rivers", &["Nile"]).store();
        let next = store.patch_entity(EntityPatch::Item(ItemId::new(), ItemPatch::name("x")));
        assert_eq!(next.items().revision(), store.items().revision());
        assert_eq!(next.items().len(), store.items().len());
    }

    #[test]
    fn test_append_child_id_skips_duplicates() {
        let list = List::new("Empty");
        let store = EntityStore::new().merge_entities(EntityMaps::default().with_list(list.clone()));
        let item = ItemId::new();
        let once = store.append_child_id(list.id, item);
        let twice = once.append_child_id(list.id, item);
        assert_eq!(twice.list(&list.id).unwrap().item_ids, vec![item]);
    }

    #[test]
    fn test_swap_pair_uses_server_order() {
        let fx = ForestFixture::new().with_list("Rivers", &["Nile", "Amazon", "Congo"]);
        let store = fx.store();
        let nile = fx.item("Nile");
        let amazon = fx.item("Amazon");

        let mut up = amazon.clone();
        up.order = 1;
        let mut down = nile.clone();
        down.order = 2;
        let next = store.swap_pair(up, down);

        let list = next.list(&fx.list_id("Rivers")).unwrap();
        assert_eq!(list.item_ids[0], amazon.id);
        assert_eq!(list.item_ids[1], nile.id);
        assert_eq!(next.item(&amazon.id).unwrap().order, 1);
        assert_eq!(next.item(&nile.id).unwrap().order, 2);
    }

    #[test]
    fn test_remove_list_leaves_items() {
        let fx = ForestFixture::new().with_list("Rivers", &["Nile"]);
        let list_id = fx.list_id("Rivers");
        let next = fx.store().remove_entity(EntityRef::List(list_id));
        assert!(next.list(&list_id).is_none());
        assert_eq!(next.items().len(), MAX_ITEMS);
    }

    #[test]
    fn test_set_parent_item_disconnects_previous_child() {
        let fx = ForestFixture::new()
            .with_list("Y", &["a"])
            .with_list("Z", &["b"])
            .with_child_list("X", "a", &["x"])
            .with_child_list("W", "b", &["w"]);
        let b = fx.item("b").id;
        let store = fx.store().receive_organizer_data(fx.organizer_maps());

        let next = store.set_parent_item(fx.list_id("X"), Some(b));
        assert_eq!(next.list(&fx.list_id("X")).unwrap().parent_item, Some(b));
        assert_eq!(next.list(&fx.list_id("W")).unwrap().parent_item, None);
        let organizer_w = next.organizer().lists.get(&fx.list_id("W")).unwrap();
        assert_eq!(organizer_w.parent_item, None);
    }

    #[test]
    fn test_organizer_keeps_unnamed_items() {
        let fx = ForestFixture::new().with_list("Rivers", &["Nile", "Amazon"]);
        let store = fx.store().receive_organizer_data(fx.organizer_maps());
        assert_eq!(store.organizer().items.len(), MAX_ITEMS);
        assert!(store.organizer().items.contains(&fx.slot_id("Rivers", 5)));
        assert_eq!(store.organizer().lists.get(&fx.list_id("Rivers")).unwrap().created_by, None);
    }

    #[test]
    fn test_stale_search_results_dropped() {
        let store = EntityStore::new().begin_search("tig", None);
        let stale = store.receive_search_results("ti", vec![ReusableItem::new("Tiger")], vec![]);
        assert!(stale.search().reusable_items.is_empty());
        let fresh = store.receive_search_results("tig", vec![ReusableItem::new("Tiger")], vec![]);
        assert_eq!(fresh.search().reusable_items.len(), 1);
    }

    #[test]
    fn test_loading_flag_keeps_revision() {
        let store = EntityStore::new();
        let loading = store.set_loading(EntityKind::List, true);
        assert!(loading.is_loading(EntityKind::List));
        assert_eq!(loading.lists().revision(), store.lists().revision());
    }

    #[test]
    fn test_reset_all_empties_everything() {
        let fx = ForestFixture::new().with_list("Rivers", &["Nile"]);
        let next = fx.store().begin_search("n", None).reset_all();
        assert!(next.lists().is_empty());
        assert!(next.items().is_empty());
        assert!(next.search().term.is_empty());
    }
}
