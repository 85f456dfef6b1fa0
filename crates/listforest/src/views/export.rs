use std::collections::HashMap;

use super::tree::resolve_items_for_list;
use crate::model::{Item, ItemId, List, ListId};

/// Renders a list as plain text: a header, the description, then each named
/// slot with its position, any child list and the item description.
///
/// ```text
/// List: Rivers
/// Long ones
///
/// 1: Nile
/// Child List: Nile towns
/// Flows north
/// ```
pub fn list_as_text(
    list: &List,
    items: &HashMap<ItemId, Item>,
    lists: &HashMap<ListId, List>,
) -> String {
    let mut text = format!("List: {}\n", list.name);
    if !list.description.is_empty() {
        text.push_str(&list.description);
        text.push('\n');
    }

    for (index, slot) in resolve_items_for_list(list, items, lists).iter().enumerate() {
        let Some(item) = slot.item.as_ref().filter(|item| !item.is_placeholder()) else {
            continue;
        };
        text.push_str(&format!("\n{}: {}\n", index + 1, item.name));
        if let Some(child) = &slot.child_list {
            text.push_str(&format!("Child List: {}\n", child.name));
        }
        if !item.description.is_empty() {
            text.push_str(&item.description);
            text.push('\n');
        }
    }

    text
}
