//! # Command Layer
//!
//! Every user action that talks to the server lives here, split in two halves:
//!
//! - a **request builder** (`*_request`) that validates the action against the
//!   current snapshot and session, then describes the call as a
//!   [`RequestSpec`](crate::effects::RequestSpec);
//! - a **response applier** (`apply_*`) that folds the server's answer into a
//!   new [`EntityStore`](crate::store::EntityStore) snapshot.
//!
//! Neither half does I/O. The [`api`](crate::api) facade stitches them
//! together around a transport, but callers that want to overlap commands can
//! drive the halves themselves and apply responses in arrival order.
//!
//! ## What Commands Do NOT Do
//!
//! - **Prompt the user**: destructive actions return a [`Confirmation`]; the
//!   caller decides and calls again.
//! - **Fail loudly**: the facade turns errors into [`CmdMessage`]s and entries
//!   in the [`ErrorBag`]. No command failure leaves the store unusable.
//!
//! ## Validation Happens Before the Request
//!
//! Empty names, missing permissions, out-of-range moves and forest cycles are
//! rejected by the request builders with [`ForestError::Validation`] or
//! [`ForestError::Cycle`](crate::error::ForestError::Cycle), so such requests
//! never reach the server.
//!
//! ## Command Modules
//!
//! - [`lists`]: fetch, create, update and delete lists
//! - [`items`]: create and edit items
//! - [`reorder`]: move items up and down by pairwise swap
//! - [`organizer`]: change which item a list hangs under
//! - [`reusable`]: search suggestions and shared reusable items
//! - [`notifications`]: fetch, mark read and delete notifications

use serde::Serialize;

use crate::error::{ForestError, Result};
use crate::model::{ItemId, List, ListId, ReusableItemId};
use crate::session::Session;

pub mod items;
pub mod lists;
pub mod notifications;
pub mod organizer;
pub mod reorder;
pub mod reusable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// A question the caller must put to the user before the action proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Confirmation {
    BecomeTopLevel {
        list: ListId,
    },
    DisconnectChild {
        list: ListId,
        parent_item: ItemId,
        child: ListId,
        child_name: String,
    },
    MakeReusableItemPublic {
        reusable_item: ReusableItemId,
    },
    MakeReusableItemPrivate {
        reusable_item: ReusableItemId,
    },
    EditSharedReusableItem {
        reusable_item: ReusableItemId,
        users: usize,
    },
    DeleteList {
        list: ListId,
        name: String,
    },
}

impl Confirmation {
    pub fn text(&self) -> String {
        match self {
            Confirmation::BecomeTopLevel { .. } => {
                "This list will no longer have a parent item and will become a top level list. Do you want to continue?".to_string()
            }
            Confirmation::DisconnectChild { child_name, .. } => format!(
                "The selected item already has the child list \"{}\". That list will be disconnected and become a top level list. Do you want to continue?",
                child_name
            ),
            Confirmation::MakeReusableItemPublic { .. } => {
                "This is a private Reusable Item; only you can see it. If you make it public, other people will be able to use it in their lists and suggest changes to it. Do you want to continue?".to_string()
            }
            Confirmation::MakeReusableItemPrivate { .. } => {
                "This is a public Reusable Item. This action will make a private copy of it which your Items will reference instead. Do you want to continue?".to_string()
            }
            Confirmation::EditSharedReusableItem { users, .. } => format!(
                "This Reusable Item is used by {} people. Your change will be proposed to them and applied when accepted. Do you want to continue?",
                users
            ),
            Confirmation::DeleteList { name, .. } => {
                format!("Are you sure you want to delete the list {}?", name)
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CmdResult {
    pub affected_lists: Vec<ListId>,
    pub affected_items: Vec<ItemId>,
    pub messages: Vec<CmdMessage>,
    /// Set when the action is waiting for the user; nothing was sent.
    pub confirmation: Option<Confirmation>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_affected_lists(mut self, lists: Vec<ListId>) -> Self {
        self.affected_lists = lists;
        self
    }

    pub fn with_affected_items(mut self, items: Vec<ItemId>) -> Self {
        self.affected_items = items;
        self
    }

    pub fn with_confirmation(mut self, confirmation: Confirmation) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}

/// Failed commands of the current view, in the order they failed.
///
/// Keys are operation names such as `"create list"`; a second failure of the
/// same operation replaces the first.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBag {
    entries: Vec<(String, String)>,
}

impl ErrorBag {
    pub fn record(&mut self, operation: impl Into<String>, message: impl Into<String>) {
        let operation = operation.into();
        self.entries.retain(|(op, _)| *op != operation);
        self.entries.push((operation, message.into()));
    }

    pub fn get(&self, operation: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(op, _)| op == operation)
            .map(|(_, message)| message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(op, message)| (op.as_str(), message.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// --- Shared checks ---

pub(crate) fn require_editable<'a>(list: Option<&'a List>, id: ListId, session: &Session) -> Result<&'a List> {
    let list = list.ok_or_else(|| ForestError::not_found("list", id))?;
    if !crate::permissions::can_edit_list(list, session) {
        return Err(ForestError::validation(format!(
            "You do not have permission to edit the list \"{}\"",
            list.name
        )));
    }
    Ok(list)
}

pub(crate) fn require_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ForestError::validation(format!("{} name must not be empty", what)));
    }
    Ok(())
}
