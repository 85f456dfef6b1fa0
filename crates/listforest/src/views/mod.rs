//! # Derived Views
//!
//! Read-only projections of an [`EntityStore`] snapshot: lists grouped by
//! visibility, a list's slots with their child lists, a list's parent, search
//! suggestions and so on.
//!
//! Every view is a plain function over entity maps, found in the submodules.
//! [`ViewCache`] wraps them with memoization: each cached view remembers the
//! revisions of the collections it read, plus its arguments, and recomputes
//! only when one of them changes. Views never mutate the snapshot.
//!
//! Cached values are returned as `Arc`s, so a caller holding one keeps a
//! consistent result even after the cache moves on.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{List, ListId, Notification, ReusableItemId, UserId};
use crate::store::EntityStore;

pub mod export;
pub mod lists;
pub mod memo;
pub mod notifications;
pub mod pagination;
pub mod suggestions;
pub mod tree;

pub use lists::GroupedLists;
pub use memo::Memo;
pub use pagination::Pager;
pub use suggestions::{Suggestion, SuggestionList};
pub use tree::{ChildIndex, OrganizerSlot, ParentLink, ResolvedItem};

type Rev = u64;

/// Memoized views over successive store snapshots.
#[derive(Debug)]
pub struct ViewCache {
    grouped: Memo<(Rev, UserId, String), GroupedLists>,
    top_level: Memo<Rev, Vec<List>>,
    public: Memo<Rev, Vec<List>>,
    child_index: Memo<Rev, ChildIndex>,
    items_for_list: Memo<(ListId, Rev, Rev), Vec<ResolvedItem>>,
    parent: Memo<(ListId, Rev, Rev), ParentLink>,
    suggestions: Memo<Rev, SuggestionList>,
    usage: Memo<(ReusableItemId, Rev, Rev), usize>,
    organizer_lists: Memo<Rev, Vec<List>>,
    organizer_slots: Memo<(Rev, Rev), HashMap<ListId, Vec<OrganizerSlot>>>,
    notifications: Memo<Rev, Vec<Notification>>,
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewCache {
    pub fn new() -> Self {
        Self {
            grouped: Memo::new("grouped lists"),
            top_level: Memo::new("top-level lists"),
            public: Memo::new("public lists"),
            child_index: Memo::new("child index"),
            items_for_list: Memo::new("items for list"),
            parent: Memo::new("parent"),
            suggestions: Memo::new("suggestions"),
            usage: Memo::new("usage count"),
            organizer_lists: Memo::new("organizer lists"),
            organizer_slots: Memo::new("organizer slots"),
            notifications: Memo::new("notifications"),
        }
    }

    /// `owner`'s lists split by visibility, narrowed to names containing
    /// `term` (an empty term keeps all).
    pub fn grouped_lists(&self, store: &EntityStore, owner: UserId, term: &str) -> Arc<GroupedLists> {
        let all = store.lists();
        self.grouped
            .get_or_compute((all.revision(), owner, term.to_string()), || {
                let matching = lists::filter_by_search_term(all.values(), term);
                lists::group_by_visibility(matching.iter(), owner)
            })
    }

    pub fn top_level_lists(&self, store: &EntityStore) -> Arc<Vec<List>> {
        let all = store.lists();
        self.top_level
            .get_or_compute(all.revision(), || lists::filter_top_level(all.values()))
    }

    pub fn public_lists(&self, store: &EntityStore) -> Arc<Vec<List>> {
        let all = store.lists();
        self.public
            .get_or_compute(all.revision(), || lists::public_lists(all.values()))
    }

    pub fn child_index(&self, store: &EntityStore) -> Arc<ChildIndex> {
        let lists = store.lists();
        self.child_index
            .get_or_compute(lists.revision(), || ChildIndex::build(lists.as_map()))
    }

    /// Slots of `list_id` with child lists resolved; empty if the list is unknown.
    pub fn items_for_list(&self, store: &EntityStore, list_id: ListId) -> Arc<Vec<ResolvedItem>> {
        let (lists, items) = (store.lists(), store.items());
        let index = self.child_index(store);
        self.items_for_list
            .get_or_compute((list_id, lists.revision(), items.revision()), || {
                match lists.get(&list_id) {
                    Some(list) => tree::resolve_items_with_index(
                        list,
                        items.as_map(),
                        lists.as_map(),
                        &index,
                    ),
                    None => Vec::new(),
                }
            })
    }

    pub fn parent_of(&self, store: &EntityStore, list_id: ListId) -> Arc<ParentLink> {
        let (lists, items) = (store.lists(), store.items());
        self.parent
            .get_or_compute((list_id, lists.revision(), items.revision()), || {
                lists
                    .get(&list_id)
                    .map(|list| tree::resolve_parent(list, items.as_map(), lists.as_map()))
                    .unwrap_or_default()
            })
    }

    pub fn suggestions(&self, store: &EntityStore) -> Arc<SuggestionList> {
        let search = store.search();
        self.suggestions.get_or_compute(search.revision, || {
            suggestions::suggestions_for(
                &search.term,
                search.widget_id.as_deref(),
                &search.reusable_items,
                &search.items,
            )
        })
    }

    pub fn usage_count(&self, store: &EntityStore, reusable_item: ReusableItemId) -> usize {
        let (lists, items) = (store.lists(), store.items());
        *self
            .usage
            .get_or_compute((reusable_item, items.revision(), lists.revision()), || {
                suggestions::usage_count(reusable_item, items.as_map(), lists.as_map())
            })
    }

    pub fn organizer_lists(&self, store: &EntityStore) -> Arc<Vec<List>> {
        let all = &store.organizer().lists;
        self.organizer_lists.get_or_compute(all.revision(), || {
            lists::sorted_organizer_lists(all.values())
        })
    }

    pub fn organizer_slots(&self, store: &EntityStore) -> Arc<HashMap<ListId, Vec<OrganizerSlot>>> {
        let organizer = store.organizer();
        self.organizer_slots.get_or_compute(
            (organizer.lists.revision(), organizer.items.revision()),
            || tree::organizer_slots_by_list(organizer.lists.as_map(), organizer.items.as_map()),
        )
    }

    pub fn notifications(&self, store: &EntityStore) -> Arc<Vec<Notification>> {
        let notifications = store.notifications();
        self.notifications.get_or_compute(notifications.revision(), || {
            notifications::sorted_notifications(notifications.as_map())
        })
    }
}
