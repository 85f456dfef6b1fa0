use serde::Serialize;
use std::cmp::Ordering;

use crate::model::{List, UserId};

/// One owner's lists split by visibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedLists {
    pub public: Vec<List>,
    pub private: Vec<List>,
}

impl GroupedLists {
    pub fn get(&self, is_public: bool) -> &[List] {
        if is_public {
            &self.public
        } else {
            &self.private
        }
    }

    pub fn len(&self) -> usize {
        self.public.len() + self.private.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Case-insensitive by name, then by id so equal names keep a stable order.
pub fn by_name(a: &List, b: &List) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

fn sorted<'a>(lists: impl IntoIterator<Item = &'a List>) -> Vec<List> {
    let mut out: Vec<List> = lists.into_iter().cloned().collect();
    out.sort_by(by_name);
    out
}

/// Partitions `owner`'s lists by `is_public`. Other owners' lists are left out.
pub fn group_by_visibility<'a>(
    lists: impl IntoIterator<Item = &'a List>,
    owner: UserId,
) -> GroupedLists {
    let (public, private): (Vec<&List>, Vec<&List>) = lists
        .into_iter()
        .filter(|list| list.created_by == Some(owner))
        .partition(|list| list.is_public);
    GroupedLists {
        public: sorted(public),
        private: sorted(private),
    }
}

pub fn filter_top_level<'a>(lists: impl IntoIterator<Item = &'a List>) -> Vec<List> {
    sorted(lists.into_iter().filter(|list| list.is_top_level()))
}

pub fn public_lists<'a>(lists: impl IntoIterator<Item = &'a List>) -> Vec<List> {
    sorted(lists.into_iter().filter(|list| list.is_public))
}

/// Lists whose name contains `term`, ignoring case. An empty term keeps all.
pub fn filter_by_search_term<'a>(
    lists: impl IntoIterator<Item = &'a List>,
    term: &str,
) -> Vec<List> {
    let needle = term.trim().to_lowercase();
    sorted(
        lists
            .into_iter()
            .filter(|list| needle.is_empty() || list.name.to_lowercase().contains(&needle)),
    )
}

/// The organizer's lists, sorted by name for the selection tree.
pub fn sorted_organizer_lists<'a>(lists: impl IntoIterator<Item = &'a List>) -> Vec<List> {
    sorted(lists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::ForestFixture;

    #[test]
    fn test_group_by_visibility_skips_other_owners() {
        let fx = ForestFixture::new()
            .with_list("Private", &[])
            .with_public_list("Public", &[])
            .with_foreign_list("Theirs", UserId::new(), true, &[]);
        let maps = fx.maps();

        let grouped = group_by_visibility(maps.lists.values(), fx.owner());
        assert_eq!(grouped.get(true).len(), 1);
        assert_eq!(grouped.get(false).len(), 1);
        assert_eq!(grouped.public[0].name, "Public");
    }

    #[test]
    fn test_sorting_ignores_case() {
        let fx = ForestFixture::new()
            .with_list("banana", &[])
            .with_list("Apple", &[])
            .with_list("cherry", &[]);
        let names: Vec<String> = filter_top_level(fx.maps().lists.values())
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_filter_top_level() {
        let fx = ForestFixture::new()
            .with_list("Rivers", &["Nile"])
            .with_child_list("Nile towns", "Nile", &[]);
        let top = filter_top_level(fx.maps().lists.values());
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Rivers");
    }

    #[test]
    fn test_filter_by_search_term() {
        let fx = ForestFixture::new()
            .with_list("Great Rivers", &[])
            .with_list("Mountains", &[]);
        let maps = fx.maps();
        assert_eq!(filter_by_search_term(maps.lists.values(), "RIVER").len(), 1);
        assert_eq!(filter_by_search_term(maps.lists.values(), "").len(), 2);
        assert!(filter_by_search_term(maps.lists.values(), "lakes").is_empty());
    }

    #[test]
    fn test_public_lists_any_owner() {
        let fx = ForestFixture::new()
            .with_public_list("Mine", &[])
            .with_foreign_list("Theirs", UserId::new(), true, &[])
            .with_foreign_list("Hidden", UserId::new(), false, &[]);
        assert_eq!(public_lists(fx.maps().lists.values()).len(), 2);
    }
}
