//! The organizer: choosing which item a list hangs under.
//!
//! ```text
//!             open()                select_parent_item()
//!   Closed ──────────► Open ◄──────────────────────────┐
//!      ▲               │ confirm()                     │
//!      │               ├── NoChange                    │
//!      │               ├── NeedsConfirmation ── resolve(false)
//!      │               │        └── resolve(true) ──┐
//!      │               └── Ready(plan) ◄────────────┘
//!      └──── reparented(plan) / close()
//! ```
//!
//! The organizer works on the owner's projection loaded by
//! [`organizer_request`] / [`apply_organizer_data`]: every list of the owner
//! with all of its slots, but without owners or descriptions. Candidates are
//! the named items of that projection, minus the items of the list being
//! moved. Permission to move a list is checked against the main store, where
//! the list was loaded with its owner.
//!
//! A candidate whose list is the target or one of its descendants would close
//! a loop in the forest. So would a candidate whose ancestry cannot be
//! followed to a top-level list, as far as the client can tell. Such a
//! candidate is refused with [`ForestError::Cycle`] when selected and again
//! when confirmed, so no request that would corrupt the forest is ever built.

use serde::Serialize;
use serde_json::json;

use super::Confirmation;
use crate::effects::endpoints::Endpoints;
use crate::effects::{RequestSpec, ResponseBody};
use crate::error::{ForestError, Result};
use crate::model::{ItemId, List, ListId};
use crate::normalize::normalize_value;
use crate::session::Session;
use crate::store::EntityStore;
use crate::views::tree::{ancestors, ChildIndex, WalkEnd};

/// Loads the forest of the list's owner.
pub fn organizer_request(endpoints: &Endpoints, store: &EntityStore, list_id: ListId) -> Result<RequestSpec> {
    let list = store
        .list(&list_id)
        .ok_or_else(|| ForestError::not_found("list", list_id))?;
    let owner = list
        .created_by
        .ok_or_else(|| ForestError::validation("This list has no owner to organize"))?;
    Ok(RequestSpec::get(endpoints.organizer(owner)))
}

pub fn apply_organizer_data(store: &EntityStore, body: &ResponseBody) -> Result<EntityStore> {
    let normalized = normalize_value(body.json()?)?;
    Ok(store.receive_organizer_data(normalized.entities))
}

/// Everything needed to send one reparent request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReparentPlan {
    pub list_id: ListId,
    /// `None` promotes the list to top level.
    pub parent_item: Option<ItemId>,
    /// A list currently anchored at `parent_item` that will lose its parent.
    pub disconnects: Option<ListId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmStep {
    NoChange,
    NeedsConfirmation(Confirmation),
    Ready(ReparentPlan),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OrganizerState {
    #[default]
    Closed,
    Open {
        list_id: ListId,
        current_parent: Option<ItemId>,
        pending: Option<ItemId>,
        awaiting: Option<(Confirmation, ReparentPlan)>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Organizer {
    state: OrganizerState,
}

fn target_list<'a>(store: &'a EntityStore, list_id: ListId) -> Option<&'a List> {
    store
        .organizer()
        .lists
        .get(&list_id)
        .or_else(|| store.list(&list_id))
}

impl Organizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OrganizerState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, OrganizerState::Open { .. })
    }

    /// The item currently selected as the new parent.
    pub fn pending(&self) -> Option<ItemId> {
        match &self.state {
            OrganizerState::Open { pending, .. } => *pending,
            OrganizerState::Closed => None,
        }
    }

    pub fn open(&mut self, store: &EntityStore, list_id: ListId) -> Result<()> {
        let list = target_list(store, list_id).ok_or_else(|| ForestError::not_found("list", list_id))?;
        tracing::debug!(list = %list_id, "opening organizer");
        self.state = OrganizerState::Open {
            list_id,
            current_parent: list.parent_item,
            pending: list.parent_item,
            awaiting: None,
        };
        Ok(())
    }

    pub fn close(&mut self) {
        self.state = OrganizerState::Closed;
    }

    /// Items the target list may be moved under, sorted by id.
    pub fn candidates(&self, store: &EntityStore) -> Vec<ItemId> {
        let OrganizerState::Open { list_id, .. } = &self.state else {
            return Vec::new();
        };
        let mut ids: Vec<ItemId> = store
            .organizer()
            .items
            .values()
            .filter(|item| check_candidate(store, *list_id, item.id).is_ok())
            .map(|item| item.id)
            .collect();
        ids.sort();
        ids
    }

    /// Picks `candidate` as the new parent. Picking the current parent again
    /// deselects it, which promotes the list to top level on confirm.
    pub fn select_parent_item(&mut self, store: &EntityStore, candidate: ItemId) -> Result<()> {
        let OrganizerState::Open {
            list_id,
            current_parent,
            pending,
            awaiting,
        } = &mut self.state
        else {
            return Err(ForestError::validation("The organizer is not open"));
        };

        *awaiting = None;
        if *current_parent == Some(candidate) {
            *pending = None;
            return Ok(());
        }
        check_candidate(store, *list_id, candidate)?;
        *pending = Some(candidate);
        Ok(())
    }

    /// Decides what the current selection means.
    pub fn confirm(&mut self, store: &EntityStore) -> Result<ConfirmStep> {
        let OrganizerState::Open {
            list_id,
            current_parent,
            pending,
            awaiting,
        } = &mut self.state
        else {
            return Err(ForestError::validation("The organizer is not open"));
        };
        let list_id = *list_id;

        let Some(parent) = *pending else {
            if current_parent.is_none() {
                return Ok(ConfirmStep::NoChange);
            }
            let confirmation = Confirmation::BecomeTopLevel { list: list_id };
            *awaiting = Some((
                confirmation.clone(),
                ReparentPlan {
                    list_id,
                    parent_item: None,
                    disconnects: None,
                },
            ));
            return Ok(ConfirmStep::NeedsConfirmation(confirmation));
        };
        if *current_parent == Some(parent) {
            return Ok(ConfirmStep::NoChange);
        }
        check_candidate(store, list_id, parent)?;

        let organizer = store.organizer();
        let plan = ReparentPlan {
            list_id,
            parent_item: Some(parent),
            disconnects: ChildIndex::build(organizer.lists.as_map())
                .child_of(&parent)
                .filter(|child| *child != list_id),
        };
        match plan.disconnects.and_then(|child| organizer.lists.get(&child)) {
            Some(child) => {
                let confirmation = Confirmation::DisconnectChild {
                    list: list_id,
                    parent_item: parent,
                    child: child.id,
                    child_name: child.name.clone(),
                };
                *awaiting = Some((confirmation.clone(), plan));
                Ok(ConfirmStep::NeedsConfirmation(confirmation))
            }
            None => Ok(ConfirmStep::Ready(plan)),
        }
    }

    /// Answers the pending confirmation. Declining returns to selection.
    pub fn resolve(&mut self, accepted: bool) -> Option<ReparentPlan> {
        let OrganizerState::Open { awaiting, .. } = &mut self.state else {
            return None;
        };
        let (_, plan) = awaiting.take()?;
        accepted.then_some(plan)
    }

    /// Records a reparent the server accepted.
    pub fn reparented(&mut self, plan: &ReparentPlan) {
        if let OrganizerState::Open {
            list_id,
            current_parent,
            pending,
            awaiting,
        } = &mut self.state
        {
            if *list_id == plan.list_id {
                *current_parent = plan.parent_item;
                *pending = plan.parent_item;
                *awaiting = None;
            }
        }
    }
}

fn check_candidate(store: &EntityStore, list_id: ListId, candidate: ItemId) -> Result<()> {
    let organizer = store.organizer();
    let item = organizer
        .items
        .get(&candidate)
        .ok_or_else(|| ForestError::not_found("item", candidate))?;
    if item.is_placeholder() {
        return Err(ForestError::validation(
            "A list can only be moved under a named item",
        ));
    }
    if item.list_id == list_id {
        return Err(ForestError::validation(
            "A list cannot be moved under one of its own items",
        ));
    }
    // A walk that stops short of a top-level list proves nothing.
    let walk = ancestors(item.list_id, organizer.lists.as_map(), organizer.items.as_map());
    if walk.chain.contains(&list_id) || walk.end != WalkEnd::Root {
        tracing::debug!(list = %list_id, %candidate, end = ?walk.end, "candidate refused");
        return Err(ForestError::Cycle {
            list: list_id,
            candidate,
        });
    }
    Ok(())
}

pub fn reparent_request(
    endpoints: &Endpoints,
    store: &EntityStore,
    session: &Session,
    plan: &ReparentPlan,
) -> Result<RequestSpec> {
    let list = store
        .list(&plan.list_id)
        .ok_or_else(|| ForestError::not_found("list", plan.list_id))?;
    if !crate::permissions::can_edit_list(list, session) {
        return Err(ForestError::validation(format!(
            "You do not have permission to edit the list \"{}\"",
            list.name
        )));
    }
    if let Some(parent) = plan.parent_item {
        check_candidate(store, plan.list_id, parent)?;
    }
    Ok(RequestSpec::patch(
        endpoints.list(plan.list_id),
        Some(json!({ "parent_item_id": plan.parent_item })),
    ))
}

/// Applies an accepted reparent, disconnecting the list previously anchored
/// at the new parent.
pub fn apply_reparent(store: &EntityStore, plan: &ReparentPlan, body: &ResponseBody) -> Result<EntityStore> {
    if let ResponseBody::Json(value) = body {
        if let Some(id) = value.get("id") {
            let echoed: ListId = serde_json::from_value(id.clone())?;
            if echoed != plan.list_id {
                return Err(ForestError::Transport(format!(
                    "Reparent response names list {} instead of {}",
                    echoed, plan.list_id
                )));
            }
        }
    }
    Ok(store.set_parent_item(plan.list_id, plan.parent_item))
}
