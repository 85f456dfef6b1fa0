//! Parent and child links across the forest.
//!
//! A list points up at the item that anchors it (`parent_item`); nothing
//! points down. [`ChildIndex`] inverts that once per recomputation so that
//! resolving the child of every slot stays linear.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::{Item, ItemId, List, ListId};

/// Reverse index from anchoring item to child list.
#[derive(Debug, Clone, Default)]
pub struct ChildIndex {
    children: HashMap<ItemId, ListId>,
}

impl ChildIndex {
    /// When two lists claim the same anchor, the smaller id wins so the
    /// result does not depend on map order.
    pub fn build(lists: &HashMap<ListId, List>) -> Self {
        let mut children: HashMap<ItemId, ListId> = HashMap::new();
        for list in lists.values() {
            if let Some(parent) = list.parent_item {
                children
                    .entry(parent)
                    .and_modify(|existing| {
                        if list.id < *existing {
                            *existing = list.id;
                        }
                    })
                    .or_insert(list.id);
            }
        }
        Self { children }
    }

    pub fn child_of(&self, item: &ItemId) -> Option<ListId> {
        self.children.get(item).copied()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// One slot of a list, resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedItem {
    pub id: ItemId,
    /// `None` when the item is not loaded.
    pub item: Option<Item>,
    pub child_list: Option<List>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParentLink {
    pub parent_item: Option<Item>,
    pub parent_list: Option<List>,
}

/// How an upward walk through the forest ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// Reached a top-level list.
    Root,
    /// Revisited this list.
    Cycle(ListId),
    /// A list on the path is not loaded.
    MissingList(ListId),
    /// A parent item on the path is not loaded.
    MissingItem(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestry {
    /// Ancestor lists, nearest first. Excludes the starting list.
    pub chain: Vec<ListId>,
    pub end: WalkEnd,
}

impl Ancestry {
    pub fn terminates(&self) -> bool {
        !matches!(self.end, WalkEnd::Cycle(_))
    }
}

pub fn resolve_items_for_list(
    list: &List,
    items: &HashMap<ItemId, Item>,
    lists: &HashMap<ListId, List>,
) -> Vec<ResolvedItem> {
    resolve_items_with_index(list, items, lists, &ChildIndex::build(lists))
}

pub fn resolve_items_with_index(
    list: &List,
    items: &HashMap<ItemId, Item>,
    lists: &HashMap<ListId, List>,
    index: &ChildIndex,
) -> Vec<ResolvedItem> {
    list.item_ids
        .iter()
        .map(|id| ResolvedItem {
            id: *id,
            item: items.get(id).cloned(),
            child_list: index.child_of(id).and_then(|child| lists.get(&child)).cloned(),
        })
        .collect()
}

pub fn resolve_parent(
    list: &List,
    items: &HashMap<ItemId, Item>,
    lists: &HashMap<ListId, List>,
) -> ParentLink {
    let parent_item = list.parent_item.and_then(|id| items.get(&id)).cloned();
    let parent_list = parent_item
        .as_ref()
        .and_then(|item| lists.get(&item.list_id))
        .cloned();
    ParentLink {
        parent_item,
        parent_list,
    }
}

/// Walks `parent_item -> owning list -> parent_item ...` upward from `start`.
///
/// The walk takes at most one step per known list, so it finishes even on a
/// corrupted forest.
pub fn ancestors(
    start: ListId,
    lists: &HashMap<ListId, List>,
    items: &HashMap<ItemId, Item>,
) -> Ancestry {
    let mut chain = Vec::new();
    let mut current = start;

    for _ in 0..=lists.len() {
        let Some(list) = lists.get(&current) else {
            return Ancestry {
                chain,
                end: WalkEnd::MissingList(current),
            };
        };
        let Some(parent) = list.parent_item else {
            return Ancestry {
                chain,
                end: WalkEnd::Root,
            };
        };
        let Some(item) = items.get(&parent) else {
            return Ancestry {
                chain,
                end: WalkEnd::MissingItem(parent),
            };
        };
        let owner = item.list_id;
        if owner == start || chain.contains(&owner) {
            return Ancestry {
                chain,
                end: WalkEnd::Cycle(owner),
            };
        }
        chain.push(owner);
        current = owner;
    }

    Ancestry {
        end: WalkEnd::Cycle(current),
        chain,
    }
}

/// True when `candidate` is `root` or sits anywhere below it.
pub fn is_descendant(
    candidate: ListId,
    root: ListId,
    lists: &HashMap<ListId, List>,
    items: &HashMap<ItemId, Item>,
) -> bool {
    candidate == root || ancestors(candidate, lists, items).chain.contains(&root)
}

/// A named item in the organizer, with the list it anchors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizerSlot {
    pub item: Item,
    pub child_list_id: Option<ListId>,
}

/// The organizer's items grouped by owning list, each group in slot order.
pub fn organizer_slots_by_list(
    lists: &HashMap<ListId, List>,
    items: &HashMap<ItemId, Item>,
) -> HashMap<ListId, Vec<OrganizerSlot>> {
    let index = ChildIndex::build(lists);
    let mut grouped: HashMap<ListId, Vec<OrganizerSlot>> = HashMap::new();
    for item in items.values().filter(|item| !item.is_placeholder()) {
        grouped.entry(item.list_id).or_default().push(OrganizerSlot {
            item: item.clone(),
            child_list_id: index.child_of(&item.id),
        });
    }
    for slots in grouped.values_mut() {
        slots.sort_by_key(|slot| slot.item.order);
    }
    grouped
}
