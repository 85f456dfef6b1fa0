//! Structural checks over a store snapshot.
//!
//! Transitions never refuse input, so a snapshot can drift out of shape when
//! the server sends something unexpected or two responses race. This module
//! reports such drift; it never repairs it.
//!
//! Checked:
//!
//! - every list has exactly `MAX_ITEMS` slots
//! - every loaded item sits at `order - 1` of its owning list
//! - a fully loaded list's orders are a permutation of `1..=MAX_ITEMS`
//! - a parent item belongs to a different list, is loaded and is named
//! - no item anchors more than one list
//! - following parents upward always reaches a top-level list

use std::collections::BTreeMap;
use std::fmt;

use super::EntityStore;
use crate::model::{ItemId, ListId, MAX_ITEMS};
use crate::views::tree::{ancestors, WalkEnd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyIssue {
    SlotCount { list: ListId, found: usize },
    ItemOutOfSlot { list: ListId, item: ItemId, order: usize },
    OrderNotPermutation { list: ListId, orders: Vec<usize> },
    SelfAnchoredParent { list: ListId, item: ItemId },
    DanglingParent { list: ListId, item: ItemId },
    PlaceholderAnchor { list: ListId, item: ItemId },
    SharedAnchor { item: ItemId, lists: Vec<ListId> },
    Cycle { list: ListId, through: ListId },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::SlotCount { list, found } => {
                write!(f, "list {} has {} slots, expected {}", list, found, MAX_ITEMS)
            }
            ConsistencyIssue::ItemOutOfSlot { list, item, order } => {
                write!(f, "item {} (order {}) is not at its slot in list {}", item, order, list)
            }
            ConsistencyIssue::OrderNotPermutation { list, orders } => {
                write!(f, "list {} has item orders {:?}", list, orders)
            }
            ConsistencyIssue::SelfAnchoredParent { list, item } => {
                write!(f, "list {} is anchored at its own item {}", list, item)
            }
            ConsistencyIssue::DanglingParent { list, item } => {
                write!(f, "list {} is anchored at unknown item {}", list, item)
            }
            ConsistencyIssue::PlaceholderAnchor { list, item } => {
                write!(f, "list {} is anchored at unnamed item {}", list, item)
            }
            ConsistencyIssue::SharedAnchor { item, lists } => {
                write!(f, "item {} anchors {} lists: {:?}", item, lists.len(), lists)
            }
            ConsistencyIssue::Cycle { list, through } => {
                write!(f, "list {} is its own ancestor through list {}", list, through)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub issues: Vec<ConsistencyIssue>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn check_consistency(store: &EntityStore) -> ConsistencyReport {
    let lists = store.lists().as_map();
    let items = store.items().as_map();
    let mut issues = Vec::new();

    let mut ordered: Vec<_> = lists.values().collect();
    ordered.sort_by_key(|list| list.id);
    let mut anchors: BTreeMap<ItemId, Vec<ListId>> = BTreeMap::new();

    for list in ordered {
        if list.item_ids.len() != MAX_ITEMS {
            issues.push(ConsistencyIssue::SlotCount {
                list: list.id,
                found: list.item_ids.len(),
            });
        }

        let mut owned: Vec<_> = items.values().filter(|i| i.list_id == list.id).collect();
        owned.sort_by_key(|item| item.order);
        for item in &owned {
            if list.item_at(item.order) != Some(item.id) {
                issues.push(ConsistencyIssue::ItemOutOfSlot {
                    list: list.id,
                    item: item.id,
                    order: item.order,
                });
            }
        }

        let fully_loaded = !list.item_ids.is_empty()
            && list.item_ids.iter().all(|id| items.contains_key(id));
        if fully_loaded {
            let orders: Vec<usize> = owned.iter().map(|item| item.order).collect();
            if orders != (1..=MAX_ITEMS).collect::<Vec<_>>() {
                issues.push(ConsistencyIssue::OrderNotPermutation {
                    list: list.id,
                    orders,
                });
            }
        }

        if let Some(parent) = list.parent_item {
            anchors.entry(parent).or_default().push(list.id);
            match items.get(&parent) {
                Some(item) if item.list_id == list.id => {
                    issues.push(ConsistencyIssue::SelfAnchoredParent {
                        list: list.id,
                        item: parent,
                    });
                }
                Some(item) if item.is_placeholder() => {
                    issues.push(ConsistencyIssue::PlaceholderAnchor {
                        list: list.id,
                        item: parent,
                    });
                }
                Some(_) => {}
                None => issues.push(ConsistencyIssue::DanglingParent {
                    list: list.id,
                    item: parent,
                }),
            }
        }

        let walk = ancestors(list.id, lists, items);
        if let WalkEnd::Cycle(through) = walk.end {
            // a self-anchored list is already reported above
            if through != list.id || !walk.chain.is_empty() {
                issues.push(ConsistencyIssue::Cycle {
                    list: list.id,
                    through,
                });
            }
        }
    }

    for (item, claimants) in anchors {
        if claimants.len() > 1 {
            issues.push(ConsistencyIssue::SharedAnchor {
                item,
                lists: claimants,
            });
        }
    }

    if !issues.is_empty() {
        tracing::debug!(count = issues.len(), "consistency issues found");
    }
    ConsistencyReport { issues }
}
