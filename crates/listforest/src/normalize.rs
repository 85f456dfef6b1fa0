//! Flattens nested server payloads into per-type entity maps.
//!
//! The server nests entities: a list carries its items, an item may carry its
//! reusable item and the child list it anchors, and that child list carries
//! its own items. The store wants flat maps keyed by id, so every nested
//! object here is replaced by its id and emitted into its own map.
//!
//! Partial payloads are normal. The organizer projection has no descriptions
//! or owners, item search results have no child lists, and detail payloads may
//! reference items by bare id. Missing fields fall back to their defaults; an
//! item whose owning list cannot be determined is skipped with a warning.
//!
//! When the same entity appears twice, the last occurrence wins.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::Result;
use crate::model::{
    Item, ItemId, List, ListId, ReusableItem, ReusableItemId, UserId,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ListPayload {
    pub id: ListId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub created_by_username: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, alias = "parent_item_id")]
    pub parent_item: Option<ItemId>,
    #[serde(default, rename = "item", alias = "items")]
    pub items: Vec<ItemRef>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub modified_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// An item as it appears inside a list payload: a bare id or the full object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ItemRef {
    Id(ItemId),
    Nested(Box<ItemPayload>),
}

impl ItemRef {
    pub fn id(&self) -> ItemId {
        match self {
            ItemRef::Id(id) => *id,
            ItemRef::Nested(item) => item.id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemPayload {
    pub id: ItemId,
    #[serde(default, alias = "list")]
    pub list_id: Option<ListId>,
    #[serde(default)]
    pub order: Option<usize>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "reusable_item_id")]
    pub reusable_item: Option<ReusableRef>,
    #[serde(default, alias = "childList")]
    pub child_list: Option<Box<ListPayload>>,
    #[serde(default)]
    pub modified_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReusableRef {
    Id(ReusableItemId),
    Nested(Box<ReusableItem>),
}

impl ReusableRef {
    pub fn id(&self) -> ReusableItemId {
        match self {
            ReusableRef::Id(id) => *id,
            ReusableRef::Nested(reusable) => reusable.id,
        }
    }
}

/// Pagination fields of a `{count, next, previous, results}` envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Flat per-type maps produced by normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityMaps {
    pub lists: HashMap<ListId, List>,
    pub items: HashMap<ItemId, Item>,
    pub reusable_items: HashMap<ReusableItemId, ReusableItem>,
}

impl EntityMaps {
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.items.is_empty() && self.reusable_items.is_empty()
    }

    /// Folds `other` into `self`; entries from `other` win.
    pub fn extend(&mut self, other: EntityMaps) {
        self.lists.extend(other.lists);
        self.items.extend(other.items);
        self.reusable_items.extend(other.reusable_items);
    }

    pub fn with_list(mut self, list: List) -> Self {
        self.lists.insert(list.id, list);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id, item);
        self
    }

    pub fn with_reusable_item(mut self, reusable: ReusableItem) -> Self {
        self.reusable_items.insert(reusable.id, reusable);
        self
    }
}

/// Result of normalizing a raw JSON response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub entities: EntityMaps,
    /// Present only when the response was a paginated envelope.
    pub page: Option<PageMeta>,
}

pub fn normalize_lists(payloads: &[ListPayload]) -> EntityMaps {
    let mut maps = EntityMaps::default();
    for payload in payloads {
        collect_list(payload, None, &mut maps);
    }
    maps
}

pub fn normalize_list(payload: &ListPayload) -> EntityMaps {
    normalize_lists(std::slice::from_ref(payload))
}

pub fn normalize_items(payloads: &[ItemPayload]) -> EntityMaps {
    let mut maps = EntityMaps::default();
    for payload in payloads {
        collect_item(payload, None, None, &mut maps);
    }
    maps
}

/// Normalizes a list response: one list object, an array of lists, or a
/// paginated envelope whose `results` are lists.
pub fn normalize_value(value: &Value) -> Result<Normalized> {
    let (records, page) = split_envelope(value)?;
    let payloads = records
        .into_iter()
        .map(serde_json::from_value::<ListPayload>)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Normalized {
        entities: normalize_lists(&payloads),
        page,
    })
}

/// Like [`normalize_value`] for responses whose records are items.
pub fn normalize_item_value(value: &Value) -> Result<Normalized> {
    let (records, page) = split_envelope(value)?;
    let payloads = records
        .into_iter()
        .map(serde_json::from_value::<ItemPayload>)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Normalized {
        entities: normalize_items(&payloads),
        page,
    })
}

/// Like [`normalize_value`] for responses whose records are reusable items.
pub fn normalize_reusable_value(value: &Value) -> Result<Normalized> {
    let (records, page) = split_envelope(value)?;
    let mut entities = EntityMaps::default();
    for record in records {
        let reusable: ReusableItem = serde_json::from_value(record)?;
        entities.reusable_items.insert(reusable.id, reusable);
    }
    Ok(Normalized { entities, page })
}

fn split_envelope(value: &Value) -> Result<(Vec<Value>, Option<PageMeta>)> {
    match value {
        Value::Array(records) => Ok((records.clone(), None)),
        Value::Object(fields) => match fields.get("results") {
            Some(Value::Array(records)) => {
                let page: PageMeta = serde_json::from_value(value.clone())?;
                Ok((records.clone(), Some(page)))
            }
            _ => Ok((vec![value.clone()], None)),
        },
        Value::Null => Ok((Vec::new(), None)),
        other => Ok((vec![other.clone()], None)),
    }
}

fn collect_list(payload: &ListPayload, anchor: Option<ItemId>, maps: &mut EntityMaps) {
    let mut item_ids = Vec::with_capacity(payload.items.len());
    for (index, item_ref) in payload.items.iter().enumerate() {
        item_ids.push(item_ref.id());
        if let ItemRef::Nested(item) = item_ref {
            collect_item(item, Some(payload.id), Some(index + 1), maps);
        }
    }

    let list = List {
        id: payload.id,
        name: payload.name.clone(),
        description: payload.description.clone(),
        is_public: payload.is_public,
        created_by: payload.created_by,
        created_by_username: payload.created_by_username.clone(),
        slug: payload.slug.clone(),
        parent_item: payload.parent_item.or(anchor),
        item_ids,
        created_at: payload.created_at,
        modified_at: payload.modified_at,
    };
    maps.lists.insert(list.id, list);
}

fn collect_item(
    payload: &ItemPayload,
    owner: Option<ListId>,
    position: Option<usize>,
    maps: &mut EntityMaps,
) {
    let Some(list_id) = payload.list_id.or(owner) else {
        tracing::warn!(item = %payload.id, "skipping item without an owning list");
        return;
    };

    let reusable_item_id = payload.reusable_item.as_ref().map(|reusable| {
        if let ReusableRef::Nested(full) = reusable {
            maps.reusable_items.insert(full.id, (**full).clone());
        }
        reusable.id()
    });

    if let Some(child) = &payload.child_list {
        collect_list(child, Some(payload.id), maps);
    }

    let item = Item {
        id: payload.id,
        list_id,
        order: payload.order.or(position).unwrap_or_default(),
        name: payload.name.clone(),
        description: payload.description.clone(),
        reusable_item_id,
        modified_at: payload.modified_at,
    };
    maps.items.insert(item.id, item);
}
