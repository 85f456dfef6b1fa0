//! Options offered while a user types an item name.
//!
//! The option list always starts with the literal text and a "create a new
//! reusable item" entry, followed by matching reusable items and then matching
//! items that are not yet linked to a reusable item. Data matches are sorted by
//! name, ignoring case. An empty search term offers nothing.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::model::{Item, ItemId, List, ListId, ReusableItem, ReusableItemId, SlotChoice};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Suggestion {
    /// Use the typed text as-is.
    Text { name: String },
    NewReusableItem { name: String },
    ReusableItem {
        id: ReusableItemId,
        name: String,
        definition: String,
    },
    #[serde(rename = "topTenItem")]
    Item { id: ItemId, name: String },
}

impl Suggestion {
    pub fn name(&self) -> &str {
        match self {
            Suggestion::Text { name }
            | Suggestion::NewReusableItem { name }
            | Suggestion::ReusableItem { name, .. }
            | Suggestion::Item { name, .. } => name,
        }
    }
}

impl From<&Suggestion> for SlotChoice {
    fn from(suggestion: &Suggestion) -> Self {
        match suggestion {
            Suggestion::Text { .. } => SlotChoice::Text,
            Suggestion::NewReusableItem { .. } => SlotChoice::NewReusableItem {
                definition: String::new(),
                link: String::new(),
            },
            Suggestion::ReusableItem { id, .. } => SlotChoice::ReusableItem { id: *id },
            Suggestion::Item { id, .. } => SlotChoice::Item { id: *id },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestionList {
    pub widget_id: Option<String>,
    pub options: Vec<Suggestion>,
}

fn matches(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(needle)
}

fn name_key(name: &str) -> String {
    name.to_lowercase()
}

pub fn suggestions_for(
    term: &str,
    widget_id: Option<&str>,
    reusable_items: &[ReusableItem],
    items: &[Item],
) -> SuggestionList {
    let widget_id = widget_id.map(str::to_string);
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return SuggestionList {
            widget_id,
            options: Vec::new(),
        };
    }

    let mut reusable: Vec<&ReusableItem> = reusable_items
        .iter()
        .filter(|r| matches(&r.name, &needle))
        .collect();
    reusable.sort_by(|a, b| name_key(&a.name).cmp(&name_key(&b.name)).then(a.id.cmp(&b.id)));

    let mut unlinked: Vec<&Item> = items
        .iter()
        .filter(|i| i.reusable_item_id.is_none() && !i.is_placeholder())
        .filter(|i| matches(&i.name, &needle))
        .collect();
    unlinked.sort_by(|a, b| name_key(&a.name).cmp(&name_key(&b.name)).then(a.id.cmp(&b.id)));

    let mut options = vec![
        Suggestion::Text {
            name: term.to_string(),
        },
        Suggestion::NewReusableItem {
            name: term.to_string(),
        },
    ];
    options.extend(reusable.into_iter().map(|r| Suggestion::ReusableItem {
        id: r.id,
        name: r.name.clone(),
        definition: r.definition.clone(),
    }));
    options.extend(unlinked.into_iter().map(|i| Suggestion::Item {
        id: i.id,
        name: i.name.clone(),
    }));

    SuggestionList { widget_id, options }
}

/// Number of distinct list owners with an item referencing `reusable_item`.
pub fn usage_count(
    reusable_item: ReusableItemId,
    items: &HashMap<ItemId, Item>,
    lists: &HashMap<ListId, List>,
) -> usize {
    items
        .values()
        .filter(|item| item.reusable_item_id == Some(reusable_item))
        .filter_map(|item| lists.get(&item.list_id))
        .filter_map(|list| list.created_by)
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListId, UserId};
    use crate::store::fixtures::ForestFixture;
    use serde_json::json;

    #[test]
    fn test_precedence_and_sorting() {
        let list = ListId::new();
        let reusable = vec![ReusableItem::new("tigon"), ReusableItem::new("Tiger")];
        let mut linked = Item::new(list, 1, "Tiger lily");
        linked.reusable_item_id = Some(reusable[0].id);
        let items = vec![
            Item::new(list, 2, "Tigris"),
            linked,
            Item::new(list, 3, "antigen"),
        ];

        let result = suggestions_for("tig", Some("item-3"), &reusable, &items);
        let names: Vec<&str> = result.options.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["tig", "tig", "Tiger", "tigon", "antigen", "Tigris"]);
        assert_eq!(result.widget_id.as_deref(), Some("item-3"));
    }

    #[test]
    fn test_empty_term_offers_nothing() {
        let reusable = vec![ReusableItem::new("Tiger")];
        assert!(suggestions_for("", None, &reusable, &[]).options.is_empty());
        assert!(suggestions_for("  ", None, &reusable, &[]).options.is_empty());
    }

    #[test]
    fn test_serialized_tags() {
        let result = suggestions_for("x", None, &[], &[Item::new(ListId::new(), 1, "xylophone")]);
        let value = serde_json::to_value(&result.options).unwrap();
        assert_eq!(value[0], json!({ "type": "text", "name": "x" }));
        assert_eq!(value[1], json!({ "type": "newReusableItem", "name": "x" }));
        assert_eq!(value[2]["type"], "topTenItem");
    }

    #[test]
    fn test_picked_suggestion_becomes_slot_choice() {
        let tiger = ReusableItem::new("Tiger");
        let result = suggestions_for("tig", None, std::slice::from_ref(&tiger), &[]);
        assert_eq!(SlotChoice::from(&result.options[0]), SlotChoice::Text);
        assert_eq!(
            SlotChoice::from(&result.options[2]),
            SlotChoice::ReusableItem { id: tiger.id }
        );
    }

    #[test]
    fn test_usage_count_counts_owners_not_items() {
        let stranger = UserId::new();
        let fx = ForestFixture::new()
            .with_list("Mine", &["Nile", "Nile again"])
            .with_foreign_list("Theirs", stranger, true, &["Le Nil"])
            .with_reusable_item("Nile", "Nile")
            .with_reusable_item("Nile again", "Nile")
            .with_reusable_item("Le Nil", "Nile");
        let maps = fx.maps();
        let nile = fx.reusable("Nile").id;

        assert_eq!(usage_count(nile, &maps.items, &maps.lists), 2);
        assert_eq!(usage_count(ReusableItemId::new(), &maps.items, &maps.lists), 0);
    }
}
