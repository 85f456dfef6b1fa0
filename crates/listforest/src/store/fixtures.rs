// --- Test Fixtures ---

use std::collections::HashMap;

use super::EntityStore;
use crate::model::{Item, ItemId, List, ListId, ReusableItem, ReusableItemId, UserId, MAX_ITEMS};
use crate::normalize::EntityMaps;

/// Builds forests of lists by name.
///
/// Every list gets the full `MAX_ITEMS` slots: the given names fill the first
/// slots and the rest are unnamed placeholders. List, item and reusable item
/// names must be unique within one fixture.
pub struct ForestFixture {
    maps: EntityMaps,
    lists: HashMap<String, ListId>,
    items: HashMap<String, ItemId>,
    reusable_items: HashMap<String, ReusableItemId>,
    owner: UserId,
}

impl Default for ForestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ForestFixture {
    pub fn new() -> Self {
        Self {
            maps: EntityMaps::default(),
            lists: HashMap::new(),
            items: HashMap::new(),
            reusable_items: HashMap::new(),
            owner: UserId::new(),
        }
    }

    /// Owner of every list not added with [`with_foreign_list`](Self::with_foreign_list).
    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn with_list(self, name: &str, items: &[&str]) -> Self {
        let owner = self.owner;
        self.push_list(name, owner, false, None, items)
    }

    pub fn with_public_list(self, name: &str, items: &[&str]) -> Self {
        let owner = self.owner;
        self.push_list(name, owner, true, None, items)
    }

    pub fn with_child_list(self, name: &str, parent_item: &str, items: &[&str]) -> Self {
        let owner = self.owner;
        let parent = self.item_id(parent_item);
        self.push_list(name, owner, false, Some(parent), items)
    }

    pub fn with_foreign_list(self, name: &str, owner: UserId, is_public: bool, items: &[&str]) -> Self {
        self.push_list(name, owner, is_public, None, items)
    }

    /// Points the named item at a reusable item, creating it on first use.
    pub fn with_reusable_item(mut self, item: &str, reusable: &str) -> Self {
        let reusable_id = match self.reusable_items.get(reusable) {
            Some(id) => *id,
            None => {
                let mut created = ReusableItem::new(reusable);
                created.is_public = true;
                created.created_by = Some(self.owner);
                let id = created.id;
                self.maps.reusable_items.insert(id, created);
                self.reusable_items.insert(reusable.to_string(), id);
                id
            }
        };
        let item_id = self.item_id(item);
        if let Some(item) = self.maps.items.get_mut(&item_id) {
            item.reusable_item_id = Some(reusable_id);
        }
        self
    }

    /// Sets a list's parent directly, bypassing every check. Used to build
    /// corrupt forests.
    pub fn with_parent(mut self, list: &str, parent_item: Option<&str>) -> Self {
        let parent = parent_item.map(|name| self.item_id(name));
        let list_id = self.list_id(list);
        if let Some(list) = self.maps.lists.get_mut(&list_id) {
            list.parent_item = parent;
        }
        self
    }

    /// Hangs `list` under slot `order` of `parent_list`, named or not.
    pub fn with_parent_slot(mut self, list: &str, parent_list: &str, order: usize) -> Self {
        let parent = self.slot_id(parent_list, order);
        let list_id = self.list_id(list);
        if let Some(list) = self.maps.lists.get_mut(&list_id) {
            list.parent_item = Some(parent);
        }
        self
    }

    pub fn store(&self) -> EntityStore {
        EntityStore::new().merge_entities(self.maps.clone())
    }

    pub fn maps(&self) -> EntityMaps {
        self.maps.clone()
    }

    /// The maps as the organizer endpoint returns them: no owner, no
    /// descriptions.
    pub fn organizer_maps(&self) -> EntityMaps {
        let mut maps = self.maps.clone();
        for list in maps.lists.values_mut() {
            list.created_by = None;
            list.description.clear();
        }
        for item in maps.items.values_mut() {
            item.description.clear();
        }
        maps.reusable_items.clear();
        maps
    }

    pub fn list_id(&self, name: &str) -> ListId {
        *self
            .lists
            .get(name)
            .unwrap_or_else(|| panic!("fixture has no list named {name}"))
    }

    pub fn list(&self, name: &str) -> List {
        self.maps.lists[&self.list_id(name)].clone()
    }

    pub fn item_id(&self, name: &str) -> ItemId {
        *self
            .items
            .get(name)
            .unwrap_or_else(|| panic!("fixture has no item named {name}"))
    }

    pub fn slot_id(&self, list: &str, order: usize) -> ItemId {
        self.maps.lists[&self.list_id(list)].item_ids[order - 1]
    }

    pub fn item(&self, name: &str) -> Item {
        self.maps.items[&self.item_id(name)].clone()
    }

    pub fn reusable(&self, name: &str) -> ReusableItem {
        let id = self
            .reusable_items
            .get(name)
            .unwrap_or_else(|| panic!("fixture has no reusable item named {name}"));
        self.maps.reusable_items[id].clone()
    }

    fn push_list(
        mut self,
        name: &str,
        owner: UserId,
        is_public: bool,
        parent_item: Option<ItemId>,
        items: &[&str],
    ) -> Self {
        let mut list = List::new(name);
        list.created_by = Some(owner);
        list.is_public = is_public;
        list.parent_item = parent_item;

        for order in 1..=MAX_ITEMS {
            let item_name = items.get(order - 1).copied().unwrap_or_default();
            let item = Item::new(list.id, order, item_name);
            if !item_name.is_empty() {
                self.items.insert(item_name.to_string(), item.id);
            }
            list.item_ids.push(item.id);
            self.maps.items.insert(item.id, item);
        }

        self.lists.insert(name.to_string(), list.id);
        self.maps.lists.insert(list.id, list);
        self
    }
}
