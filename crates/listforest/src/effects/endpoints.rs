use url::form_urlencoded::byte_serialize;

use crate::model::{ItemId, ListId, NotificationId, ReusableItemId, UserId};

/// Filters for the list collection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Server-defined list set, e.g. `"my"` or `"public"`.
    pub listset: Option<String>,
    pub top_level_only: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Route builder rooted at the configured API prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    root: String,
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

impl Endpoints {
    pub fn new(api_root: &str) -> Self {
        let mut root = api_root.trim_end_matches('/').to_string();
        root.push('/');
        Self { root }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn lists(&self, query: &ListQuery) -> String {
        let mut url = format!("{}list/?", self.root);
        if query.top_level_only {
            url.push_str("&toplevel=1");
        }
        if let Some(listset) = &query.listset {
            url.push_str(&format!("&listset={}", encode(listset)));
        }
        if let Some(limit) = query.limit {
            url.push_str(&format!("&limit={}", limit));
        }
        if let Some(offset) = query.offset.filter(|offset| *offset > 0) {
            url.push_str(&format!("&offset={}", offset));
        }
        url
    }

    pub fn list_collection(&self) -> String {
        format!("{}list/", self.root)
    }

    pub fn list_detail(&self, id: ListId) -> String {
        format!("{}listdetail/?id={}", self.root, id)
    }

    pub fn list_by_slug(&self, slug: &str) -> String {
        format!("{}listdetail/?slug={}", self.root, encode(slug))
    }

    pub fn list(&self, id: ListId) -> String {
        format!("{}list/{}/", self.root, id)
    }

    /// Minimal projection of `owner`'s forest for the organizer.
    pub fn organizer(&self, owner: UserId) -> String {
        format!(
            "{}list/?expand=item&fields=id,name,item,is_public,order,parent_item&created_by={}",
            self.root, owner
        )
    }

    pub fn item_collection(&self) -> String {
        format!("{}item/", self.root)
    }

    pub fn item(&self, id: ItemId) -> String {
        format!("{}item/{}/", self.root, id)
    }

    pub fn move_up(&self, id: ItemId) -> String {
        format!("{}item/{}/moveup/", self.root, id)
    }

    pub fn search_reusable_items(&self, term: &str) -> String {
        format!("{}searchreusableitems/?search={}", self.root, encode(term))
    }

    /// Item search, excluding items already linked to a reusable item.
    pub fn search_items(&self, term: &str) -> String {
        format!(
            "{}searchlistsitems/?search={}&includelists=false&excludereusableitems=true",
            self.root,
            encode(term)
        )
    }

    pub fn reusable_item(&self, id: ReusableItemId) -> String {
        format!("{}reusableitem/{}/", self.root, id)
    }

    pub fn notifications(&self) -> String {
        format!("{}notification/", self.root)
    }

    pub fn notification(&self, id: NotificationId) -> String {
        format!("{}notification/{}/", self.root, id)
    }
}
