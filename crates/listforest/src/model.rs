//! # Domain Model: Lists, Items and Reusable Items
//!
//! This module defines the entity types held by the store: [`List`], [`Item`],
//! [`ReusableItem`] and [`Notification`], their id newtypes, and the patch
//! records used for targeted edits.
//!
//! ## Lists Are Fixed-Size Slot Sequences
//!
//! A list always owns exactly [`MAX_ITEMS`] item slots. The server creates all
//! of them when the list is created; a slot whose item has an empty name is a
//! placeholder. Its position still counts:
//!
//! ```text
//! List "Rivers"           item_ids[0] -> Item{order: 1, name: "Nile"}
//!                         item_ids[1] -> Item{order: 2, name: "Amazon"}
//!                         item_ids[2] -> Item{order: 3, name: ""}   <- unused slot
//!                         ...
//!                         item_ids[9] -> Item{order: 10, name: ""}
//! ```
//!
//! ## The Forest
//!
//! Any named item may anchor one child list (`List::parent_item`). Following
//! `parent_item -> Item::list_id -> parent_item ...` must always terminate:
//! the lists form a forest, never a graph with cycles.
//!
//! ## Slot Drafts
//!
//! Forms that edit several slots at once (creating a list with its first
//! items) carry a [`SlotDrafts`] map from slot order to a [`SlotDraft`]
//! record rather than flat string keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Number of item slots in every list.
pub const MAX_ITEMS: usize = 10;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Server-assigned id of a [`List`].
    ListId
);
entity_id!(
    /// Server-assigned id of an [`Item`].
    ItemId
);
entity_id!(
    /// Server-assigned id of a [`ReusableItem`].
    ReusableItemId
);
entity_id!(NotificationId);
entity_id!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    List,
    Item,
    ReusableItem,
    Notification,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::List => "list",
            EntityKind::Item => "item",
            EntityKind::ReusableItem => "reusable item",
            EntityKind::Notification => "notification",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
    /// Absent in the organizer projection.
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub created_by_username: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_item: Option<ItemId>,
    #[serde(default)]
    pub item_ids: Vec<ItemId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl List {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ListId::new(),
            name: name.into(),
            description: String::new(),
            is_public: false,
            created_by: None,
            created_by_username: String::new(),
            slug: None,
            parent_item: None,
            item_ids: Vec::new(),
            created_at: None,
            modified_at: None,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_item.is_none()
    }

    /// Id of the item occupying slot `order` (1-based), if the slot exists.
    pub fn item_at(&self, order: usize) -> Option<ItemId> {
        order
            .checked_sub(1)
            .and_then(|idx| self.item_ids.get(idx))
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub list_id: ListId,
    pub order: usize,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reusable_item_id: Option<ReusableItemId>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(list_id: ListId, order: usize, name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            list_id,
            order,
            name: name.into(),
            description: String::new(),
            reusable_item_id: None,
            modified_at: None,
        }
    }

    /// An unnamed item only holds its slot.
    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty()
    }

    /// Zero-based slot index, if `order` is within `1..=MAX_ITEMS`.
    pub fn slot(&self) -> Option<usize> {
        (1..=MAX_ITEMS)
            .contains(&self.order)
            .then(|| self.order - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposedModification {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub proposed_by: Option<UserId>,
    #[serde(default)]
    pub proposed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub votes_yes: Vec<UserId>,
    #[serde(default)]
    pub votes_no: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReusableItemVersion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub modified_by: Option<UserId>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub users_when_modified: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReusableItem {
    pub id: ReusableItemId,
    pub name: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub modified_by: Option<UserId>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    /// Number of distinct users referencing this item when the last change was accepted.
    #[serde(default)]
    pub users_when_modified: u32,
    #[serde(default, alias = "proposed_modification")]
    pub proposed_modifications: Vec<ProposedModification>,
    #[serde(default)]
    pub history: Vec<ReusableItemVersion>,
}

impl ReusableItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ReusableItemId::new(),
            name: name.into(),
            definition: String::new(),
            link: String::new(),
            is_public: false,
            created_by: None,
            modified_by: None,
            modified_at: None,
            users_when_modified: 0,
            proposed_modifications: Vec::new(),
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default)]
    pub item_id: Option<ItemId>,
    #[serde(default)]
    pub reusable_item_id: Option<ReusableItemId>,
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub unread: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub text: String,
}

// --- Patches ---

/// Named fields to overwrite on a [`List`]. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    /// `Some(None)` promotes the list to top level.
    #[serde(rename = "parent_item_id", skip_serializing_if = "Option::is_none")]
    pub parent_item: Option<Option<ItemId>>,
    #[serde(skip)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl ListPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn is_public(is_public: bool) -> Self {
        Self {
            is_public: Some(is_public),
            ..Default::default()
        }
    }

    pub fn parent_item(parent_item: Option<ItemId>) -> Self {
        Self {
            parent_item: Some(parent_item),
            ..Default::default()
        }
    }

    /// The editable fields of a list returned by the server after an update.
    pub fn from_list(list: &List) -> Self {
        Self {
            name: Some(list.name.clone()),
            description: Some(list.description.clone()),
            is_public: Some(list.is_public),
            parent_item: Some(list.parent_item),
            modified_at: list.modified_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.is_public.is_none()
            && self.parent_item.is_none()
    }

    pub fn apply(&self, list: &mut List) {
        if let Some(name) = &self.name {
            list.name = name.clone();
        }
        if let Some(description) = &self.description {
            list.description = description.clone();
        }
        if let Some(is_public) = self.is_public {
            list.is_public = is_public;
        }
        if let Some(parent_item) = self.parent_item {
            list.parent_item = parent_item;
        }
        if self.modified_at.is_some() {
            list.modified_at = self.modified_at;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
    #[serde(
        rename = "reusable_item_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub reusable_item: Option<Option<ReusableItemId>>,
    #[serde(skip)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl ItemPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn from_item(item: &Item) -> Self {
        Self {
            name: Some(item.name.clone()),
            description: Some(item.description.clone()),
            order: Some(item.order),
            reusable_item: Some(item.reusable_item_id),
            modified_at: item.modified_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.order.is_none()
            && self.reusable_item.is_none()
    }

    pub fn apply(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(order) = self.order {
            item.order = order;
        }
        if let Some(reusable_item) = self.reusable_item {
            item.reusable_item_id = reusable_item;
        }
        if self.modified_at.is_some() {
            item.modified_at = self.modified_at;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReusableItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl ReusableItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.definition.is_none()
            && self.link.is_none()
            && self.is_public.is_none()
    }

    pub fn apply(&self, reusable_item: &mut ReusableItem) {
        if let Some(name) = &self.name {
            reusable_item.name = name.clone();
        }
        if let Some(definition) = &self.definition {
            reusable_item.definition = definition.clone();
        }
        if let Some(link) = &self.link {
            reusable_item.link = link.clone();
        }
        if let Some(is_public) = self.is_public {
            reusable_item.is_public = is_public;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<bool>,
}

impl NotificationPatch {
    pub fn apply(&self, notification: &mut Notification) {
        if let Some(new) = self.new {
            notification.new = new;
        }
        if let Some(unread) = self.unread {
            notification.unread = unread;
        }
    }
}

/// A targeted edit of one entity: the type, the id and the fields to overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityPatch {
    List(ListId, ListPatch),
    Item(ItemId, ItemPatch),
    ReusableItem(ReusableItemId, ReusableItemPatch),
    Notification(NotificationId, NotificationPatch),
}

/// A reference to one entity of any type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    List(ListId),
    Item(ItemId),
    ReusableItem(ReusableItemId),
    Notification(NotificationId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::List(_) => EntityKind::List,
            EntityRef::Item(_) => EntityKind::Item,
            EntityRef::ReusableItem(_) => EntityKind::ReusableItem,
            EntityRef::Notification(_) => EntityKind::Notification,
        }
    }
}

// --- Slot drafts ---

/// What the name typed into a slot refers to, once a suggestion is picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotChoice {
    /// Plain text, no reusable item.
    #[default]
    Text,
    /// Create a reusable item from the typed name.
    NewReusableItem {
        #[serde(default)]
        definition: String,
        #[serde(default)]
        link: String,
    },
    ReusableItem { id: ReusableItemId },
    /// Create a reusable item shared with this existing item.
    Item { id: ItemId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub choice: SlotChoice,
}

/// Per-slot form state, keyed by slot order (`1..=MAX_ITEMS`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotDrafts {
    slots: BTreeMap<usize, SlotDraft>,
}

impl SlotDrafts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the draft for slot `order`. Orders outside `1..=MAX_ITEMS` are ignored.
    pub fn set(&mut self, order: usize, draft: SlotDraft) -> bool {
        if !(1..=MAX_ITEMS).contains(&order) {
            return false;
        }
        self.slots.insert(order, draft);
        true
    }

    pub fn with(mut self, order: usize, name: impl Into<String>) -> Self {
        self.set(
            order,
            SlotDraft {
                name: name.into(),
                ..Default::default()
            },
        );
        self
    }

    /// Records what slot `order` refers to. Returns false if the slot has no draft.
    pub fn choose(&mut self, order: usize, choice: SlotChoice) -> bool {
        match self.slots.get_mut(&order) {
            Some(draft) => {
                draft.choice = choice;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, order: usize) -> Option<&SlotDraft> {
        self.slots.get(&order)
    }

    /// All `MAX_ITEMS` slots in order, empty drafts filling the gaps.
    pub fn to_slots(&self) -> Vec<(usize, SlotDraft)> {
        (1..=MAX_ITEMS)
            .map(|order| (order, self.slots.get(&order).cloned().unwrap_or_default()))
            .collect()
    }
}

// --- Creation requests ---

/// A list to create, with drafts for its first slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewList {
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub parent_item: Option<ItemId>,
    pub slots: SlotDrafts,
}

impl NewList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewItem {
    pub list_id: ListId,
    pub order: usize,
    pub name: String,
    pub description: String,
}
