//! # API Facade
//!
//! [`ForestApp`] is the single entry point for embedding applications. It owns
//! the current [`EntityStore`] snapshot, the [`ViewCache`], the session and
//! the transport, and runs each command as
//!
//! ```text
//! validate (request builder) -> Transport::request -> apply (response applier) -> new snapshot
//! ```
//!
//! ## What the Facade Does NOT Do
//!
//! - **Business logic**: that belongs in `commands/*.rs`.
//! - **Return errors**: every command method returns a [`CmdResult`]. Failures
//!   become an error message in the result and an entry in the [`ErrorBag`],
//!   keyed by operation name. The snapshot is left as it was.
//! - **Ask the user**: actions needing confirmation return a result carrying a
//!   [`Confirmation`] and send nothing. Call again with `confirmed = true`.
//!
//! ## Generic Over Transport
//!
//! `ForestApp<T: Transport>` is generic over how requests reach the server:
//! - Production: an HTTP client supplied by the embedding application
//! - Testing: [`ScriptedTransport`](crate::effects::ScriptedTransport)
//!
//! ## One Command at a Time
//!
//! Command methods take `&mut self`, so one app has one command in flight.
//! Callers that need to overlap commands use the request builders and
//! response appliers in [`commands`](crate::commands) directly, applying
//! responses in arrival order; the last response to arrive wins.

use std::sync::Arc;

use crate::commands::organizer::{ConfirmStep, Organizer, ReparentPlan};
use crate::commands::reorder::MoveDirection;
use crate::commands::{
    items, lists, notifications, organizer, reorder, reusable, CmdMessage, CmdResult, ErrorBag,
};
use crate::config::ForestConfig;
use crate::effects::endpoints::{Endpoints, ListQuery};
use crate::effects::{RequestSpec, ResponseBody, Transport};
use crate::error::{ForestError, Result};
use crate::model::{
    EntityKind, ItemId, ItemPatch, List, ListId, ListPatch, NewItem, NewList, Notification,
    NotificationId, ReusableItemId, ReusableItemPatch,
};
use crate::permissions;
use crate::session::Session;
use crate::store::doctor::{check_consistency, ConsistencyReport};
use crate::store::EntityStore;
use crate::views::{
    export, notifications as notification_views, GroupedLists, OrganizerSlot, Pager, ParentLink,
    ResolvedItem, SuggestionList, ViewCache,
};
use std::collections::HashMap;

pub struct ForestApp<T: Transport> {
    transport: T,
    config: ForestConfig,
    endpoints: Endpoints,
    session: Session,
    store: EntityStore,
    views: ViewCache,
    errors: ErrorBag,
    organizer: Organizer,
}

impl<T: Transport> ForestApp<T> {
    pub fn new(transport: T, config: ForestConfig) -> Self {
        let endpoints = Endpoints::new(&config.api_root);
        Self {
            transport,
            config,
            endpoints,
            session: Session::anonymous(),
            store: EntityStore::new(),
            views: ViewCache::new(),
            errors: ErrorBag::default(),
            organizer: Organizer::new(),
        }
    }

    // --- Accessors ---

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn errors(&self) -> &ErrorBag {
        &self.errors
    }

    pub fn organizer(&self) -> &Organizer {
        &self.organizer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // --- Session ---

    pub fn login(&mut self, session: Session) -> CmdResult {
        tracing::info!(user = %session.username, "logged in");
        let message = CmdMessage::info(format!("Logged in as {}", session.username));
        self.session = session;
        CmdResult::default().with_message(message)
    }

    /// Forgets everything: session, snapshot, errors and organizer.
    pub fn logout(&mut self) -> CmdResult {
        tracing::info!("logged out");
        self.session = Session::anonymous();
        self.store = self.store.reset_all();
        self.errors.clear();
        self.organizer.close();
        CmdResult::default().with_message(CmdMessage::info("Logged out"))
    }

    // --- Plumbing ---

    async fn send(&self, spec: RequestSpec) -> Result<ResponseBody> {
        tracing::info!(method = %spec.method, endpoint = %spec.endpoint, "issuing command");
        self.transport.request(spec).await
    }

    fn finish(&mut self, operation: &str, outcome: Result<CmdResult>) -> CmdResult {
        match outcome {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(operation, error = %err, "command failed");
                let message = err.to_string();
                self.errors.record(operation, message.clone());
                CmdResult::default().with_message(CmdMessage::error(message))
            }
        }
    }

    fn stop_loading(&mut self, kind: EntityKind) {
        if self.store.is_loading(kind) {
            self.store = self.store.set_loading(kind, false);
        }
    }

    // --- Lists ---

    /// Query for page `page` (1-based) of `listset`, top-level lists only.
    pub fn list_query(&self, listset: &str, page: usize) -> ListQuery {
        let page_size = self.config.page_size;
        ListQuery {
            listset: Some(listset.to_string()),
            top_level_only: true,
            limit: Some(page_size),
            offset: Some(page.saturating_sub(1) * page_size),
        }
    }

    /// Replaces the snapshot's lists with one page from the server.
    pub async fn fetch_lists(&mut self, query: &ListQuery) -> CmdResult {
        self.store = self.store.set_loading(EntityKind::List, true);
        let outcome = self.try_fetch_lists(query).await;
        self.stop_loading(EntityKind::List);
        self.finish("fetch lists", outcome)
    }

    async fn try_fetch_lists(&mut self, query: &ListQuery) -> Result<CmdResult> {
        let spec = lists::fetch_lists_request(&self.endpoints, query, &self.session);
        let body = self.send(spec).await?;
        self.store = lists::apply_lists_page(&self.store, &body)?;
        let ids = self.store.lists().iter().map(|(id, _)| *id).collect();
        Ok(CmdResult::default().with_affected_lists(ids))
    }

    pub async fn fetch_list_detail(&mut self, id: ListId) -> CmdResult {
        self.store = self.store.set_loading(EntityKind::List, true);
        let spec = lists::fetch_list_detail_request(&self.endpoints, id, &self.session);
        let outcome = self.try_fetch_detail(spec).await;
        self.stop_loading(EntityKind::List);
        self.finish("fetch list detail", outcome)
    }

    pub async fn fetch_list_by_slug(&mut self, slug: &str) -> CmdResult {
        let spec = match lists::fetch_list_by_slug_request(&self.endpoints, slug, &self.session) {
            Ok(spec) => spec,
            Err(err) => return self.finish("fetch list detail", Err(err)),
        };
        self.store = self.store.set_loading(EntityKind::List, true);
        let outcome = self.try_fetch_detail(spec).await;
        self.stop_loading(EntityKind::List);
        self.finish("fetch list detail", outcome)
    }

    async fn try_fetch_detail(&mut self, spec: RequestSpec) -> Result<CmdResult> {
        let body = self.send(spec).await?;
        self.store = lists::apply_list_detail(&self.store, &body)?;
        Ok(CmdResult::default())
    }

    pub async fn create_list(&mut self, new_list: &NewList) -> CmdResult {
        let outcome = self.try_create_list(new_list).await;
        self.finish("create list", outcome)
    }

    async fn try_create_list(&mut self, new_list: &NewList) -> Result<CmdResult> {
        let spec = lists::create_list_request(&self.endpoints, &self.store, &self.session, new_list)?;
        let body = self.send(spec).await?;
        let (store, id) = lists::apply_created_list(&self.store, &body)?;
        self.store = store;
        Ok(CmdResult::default()
            .with_affected_lists(vec![id])
            .with_message(CmdMessage::success(format!("Created list {}", new_list.name.trim()))))
    }

    pub async fn update_list(&mut self, id: ListId, patch: &ListPatch) -> CmdResult {
        let outcome = self.try_update_list(id, patch).await;
        self.finish("update list", outcome)
    }

    async fn try_update_list(&mut self, id: ListId, patch: &ListPatch) -> Result<CmdResult> {
        let spec = lists::update_list_request(&self.endpoints, &self.store, &self.session, id, patch)?;
        let body = self.send(spec).await?;
        self.store = lists::apply_list_update(&self.store, &body)?;
        Ok(CmdResult::default().with_affected_lists(vec![id]))
    }

    pub async fn set_list_public(&mut self, id: ListId, is_public: bool) -> CmdResult {
        self.update_list(id, &ListPatch::is_public(is_public)).await
    }

    /// Deletes a list once `confirmed`; otherwise returns the question to ask.
    pub async fn delete_list(&mut self, id: ListId, confirmed: bool) -> CmdResult {
        let outcome = self.try_delete_list(id, confirmed).await;
        self.finish("delete list", outcome)
    }

    async fn try_delete_list(&mut self, id: ListId, confirmed: bool) -> Result<CmdResult> {
        let spec = lists::delete_list_request(&self.endpoints, &self.store, &self.session, id)?;
        if !confirmed {
            let name = self.store.list(&id).map(|l| l.name.clone()).unwrap_or_default();
            return Ok(CmdResult::default()
                .with_confirmation(crate::commands::Confirmation::DeleteList { list: id, name }));
        }
        self.send(spec).await?;
        self.store = lists::apply_list_deleted(&self.store, id);
        Ok(CmdResult::default()
            .with_affected_lists(vec![id])
            .with_message(CmdMessage::success("List deleted")))
    }

    // --- Items ---

    pub async fn create_item(&mut self, new_item: &NewItem) -> CmdResult {
        let outcome = self.try_create_item(new_item).await;
        self.finish("create item", outcome)
    }

    async fn try_create_item(&mut self, new_item: &NewItem) -> Result<CmdResult> {
        let spec = items::create_item_request(&self.endpoints, &self.store, &self.session, new_item)?;
        let body = self.send(spec).await?;
        let (store, id) = items::apply_created_item(&self.store, &body)?;
        self.store = store;
        Ok(CmdResult::default()
            .with_affected_lists(vec![new_item.list_id])
            .with_affected_items(vec![id]))
    }

    pub async fn update_item(&mut self, id: ItemId, patch: &ItemPatch) -> CmdResult {
        let outcome = self.try_update_item(id, patch).await;
        self.finish("update item", outcome)
    }

    async fn try_update_item(&mut self, id: ItemId, patch: &ItemPatch) -> Result<CmdResult> {
        let spec = items::update_item_request(&self.endpoints, &self.store, &self.session, id, patch)?;
        let body = self.send(spec).await?;
        self.store = items::apply_item_update(&self.store, &body)?;
        Ok(CmdResult::default().with_affected_items(vec![id]))
    }

    pub async fn move_item_up(&mut self, id: ItemId) -> CmdResult {
        let outcome = self.try_move(id, MoveDirection::Up).await;
        self.finish("move item up", outcome)
    }

    pub async fn move_item_down(&mut self, id: ItemId) -> CmdResult {
        let outcome = self.try_move(id, MoveDirection::Down).await;
        self.finish("move item down", outcome)
    }

    async fn try_move(&mut self, id: ItemId, direction: MoveDirection) -> Result<CmdResult> {
        let spec = match direction {
            MoveDirection::Up => reorder::move_up_request(&self.endpoints, &self.store, &self.session, id)?,
            MoveDirection::Down => {
                reorder::move_down_request(&self.endpoints, &self.store, &self.session, id)?
            }
        };
        let body = self.send(spec).await?;
        let (store, moved) = reorder::apply_move_up(&self.store, &body)?;
        self.store = store;
        let list = self.store.item(&id).map(|item| item.list_id);
        Ok(CmdResult::default()
            .with_affected_lists(list.into_iter().collect())
            .with_affected_items(moved.to_vec()))
    }

    pub fn can_move(&self, id: ItemId, direction: MoveDirection) -> bool {
        let editable = self
            .store
            .item(&id)
            .and_then(|item| self.store.list(&item.list_id))
            .is_some_and(|list| permissions::can_edit_list(list, &self.session));
        editable && reorder::can_move(&self.store, id, direction)
    }

    // --- Organizer ---

    /// Loads the owner's forest and opens the organizer for `list_id`.
    pub async fn open_organizer(&mut self, list_id: ListId) -> CmdResult {
        let outcome = self.try_open_organizer(list_id).await;
        self.finish("open organizer", outcome)
    }

    async fn try_open_organizer(&mut self, list_id: ListId) -> Result<CmdResult> {
        let spec = organizer::organizer_request(&self.endpoints, &self.store, list_id)?;
        let body = self.send(spec).await?;
        self.store = organizer::apply_organizer_data(&self.store, &body)?;
        self.organizer.open(&self.store, list_id)?;
        Ok(CmdResult::default().with_affected_lists(vec![list_id]))
    }

    pub fn select_parent_item(&mut self, candidate: ItemId) -> CmdResult {
        let outcome = self
            .organizer
            .select_parent_item(&self.store, candidate)
            .map(|_| CmdResult::default().with_affected_items(vec![candidate]));
        self.finish("select parent item", outcome)
    }

    /// Acts on the organizer's selection: nothing, a question, or the reparent.
    pub async fn confirm_organizer(&mut self) -> CmdResult {
        let outcome = self.try_confirm_organizer().await;
        self.finish("reparent list", outcome)
    }

    async fn try_confirm_organizer(&mut self) -> Result<CmdResult> {
        match self.organizer.confirm(&self.store)? {
            ConfirmStep::NoChange => {
                Ok(CmdResult::default().with_message(CmdMessage::info("No change to the parent item")))
            }
            ConfirmStep::NeedsConfirmation(confirmation) => {
                Ok(CmdResult::default().with_confirmation(confirmation))
            }
            ConfirmStep::Ready(plan) => self.reparent(plan).await,
        }
    }

    /// Answers the organizer's question. Declining sends nothing.
    pub async fn resolve_organizer(&mut self, accepted: bool) -> CmdResult {
        let outcome = match self.organizer.resolve(accepted) {
            Some(plan) => self.reparent(plan).await,
            None => Ok(CmdResult::default().with_message(CmdMessage::info("Parent item unchanged"))),
        };
        self.finish("reparent list", outcome)
    }

    async fn reparent(&mut self, plan: ReparentPlan) -> Result<CmdResult> {
        let spec = organizer::reparent_request(&self.endpoints, &self.store, &self.session, &plan)?;
        let body = self.send(spec).await?;
        self.store = organizer::apply_reparent(&self.store, &plan, &body)?;
        self.organizer.reparented(&plan);

        let mut affected = vec![plan.list_id];
        affected.extend(plan.disconnects);
        let mut result = CmdResult::default().with_affected_lists(affected);
        if let Some(child) = plan.disconnects.and_then(|id| self.store.list(&id)) {
            result.add_message(CmdMessage::warning(format!(
                "The list \"{}\" is now a top level list",
                child.name
            )));
        }
        result.add_message(CmdMessage::success(match plan.parent_item {
            Some(_) => "Parent item changed",
            None => "The list is now a top level list",
        }));
        Ok(result)
    }

    pub fn close_organizer(&mut self) {
        self.organizer.close();
    }

    pub fn organizer_candidates(&self) -> Vec<ItemId> {
        self.organizer.candidates(&self.store)
    }

    // --- Search and reusable items ---

    /// Runs both suggestion searches for `term`. An empty term clears them.
    pub async fn search(&mut self, term: &str, widget_id: Option<&str>) -> CmdResult {
        let Some((reusable_spec, items_spec)) =
            reusable::search_requests(&self.endpoints, &self.session, term)
        else {
            self.store = self.store.clear_search();
            return CmdResult::default();
        };
        self.store = self
            .store
            .begin_search(term.trim(), widget_id.map(str::to_string));
        let outcome = self.try_search(term.trim(), reusable_spec, items_spec).await;
        self.finish("search", outcome)
    }

    async fn try_search(
        &mut self,
        term: &str,
        reusable_spec: RequestSpec,
        items_spec: RequestSpec,
    ) -> Result<CmdResult> {
        let reusable_body = self.send(reusable_spec).await?;
        let items_body = self.send(items_spec).await?;
        self.store = reusable::apply_search_results(&self.store, term, &reusable_body, &items_body)?;
        Ok(CmdResult::default())
    }

    pub async fn set_reusable_item_public(
        &mut self,
        id: ReusableItemId,
        is_public: bool,
        confirmed: bool,
    ) -> CmdResult {
        let outcome = self.try_set_reusable_public(id, is_public, confirmed).await;
        self.finish("update reusable item", outcome)
    }

    async fn try_set_reusable_public(
        &mut self,
        id: ReusableItemId,
        is_public: bool,
        confirmed: bool,
    ) -> Result<CmdResult> {
        let spec = reusable::set_reusable_public_request(
            &self.endpoints,
            &self.store,
            &self.session,
            id,
            is_public,
        )?;
        if !confirmed {
            let confirmation = reusable::visibility_confirmation(&self.store, id, is_public)?;
            return Ok(CmdResult::default().with_confirmation(confirmation));
        }
        let body = self.send(spec).await?;
        let (store, new_id) = reusable::apply_reusable_visibility(&self.store, &self.session, id, &body)?;
        self.store = store;
        let mut result = CmdResult::default();
        if new_id != id {
            result.add_message(CmdMessage::info(
                "Your items now use a private copy of this reusable item",
            ));
        }
        Ok(result)
    }

    pub async fn update_reusable_item(
        &mut self,
        id: ReusableItemId,
        patch: &ReusableItemPatch,
        confirmed: bool,
    ) -> CmdResult {
        let outcome = self.try_update_reusable(id, patch, confirmed).await;
        self.finish("update reusable item", outcome)
    }

    async fn try_update_reusable(
        &mut self,
        id: ReusableItemId,
        patch: &ReusableItemPatch,
        confirmed: bool,
    ) -> Result<CmdResult> {
        let spec = reusable::update_reusable_request(&self.endpoints, &self.store, &self.session, id, patch)?;
        if !confirmed {
            let threshold = self.config.usage_warning_threshold;
            if let Some(confirmation) = reusable::edit_confirmation(&self.store, id, threshold) {
                return Ok(CmdResult::default().with_confirmation(confirmation));
            }
        }
        let body = self.send(spec).await?;
        self.store = reusable::apply_reusable_update(&self.store, &body)?;
        Ok(CmdResult::default())
    }

    pub async fn fetch_reusable_item(&mut self, id: ReusableItemId) -> CmdResult {
        let outcome = self.try_fetch_reusable(id).await;
        self.finish("fetch reusable item", outcome)
    }

    async fn try_fetch_reusable(&mut self, id: ReusableItemId) -> Result<CmdResult> {
        let spec = reusable::fetch_reusable_request(&self.endpoints, &self.session, id);
        let body = self.send(spec).await?;
        self.store = reusable::apply_reusable_detail(&self.store, &body)?;
        Ok(CmdResult::default())
    }

    // --- Notifications ---

    pub async fn fetch_notifications(&mut self) -> CmdResult {
        self.store = self.store.set_loading(EntityKind::Notification, true);
        let outcome = self.try_fetch_notifications().await;
        self.stop_loading(EntityKind::Notification);
        self.finish("fetch notifications", outcome)
    }

    async fn try_fetch_notifications(&mut self) -> Result<CmdResult> {
        let spec = notifications::fetch_request(&self.endpoints, &self.session)?;
        let body = self.send(spec).await?;
        self.store = notifications::apply_notifications(&self.store, &body)?;
        Ok(CmdResult::default())
    }

    pub async fn mark_notification_read(&mut self, id: NotificationId) -> CmdResult {
        let outcome = self.try_mark_read(id).await;
        self.finish("mark notification read", outcome)
    }

    async fn try_mark_read(&mut self, id: NotificationId) -> Result<CmdResult> {
        let spec = notifications::mark_read_request(&self.endpoints, &self.store, &self.session, id)?;
        self.send(spec).await?;
        self.store = notifications::apply_mark_read(&self.store, id);
        Ok(CmdResult::default())
    }

    pub async fn delete_notification(&mut self, id: NotificationId) -> CmdResult {
        let outcome = self.try_delete_notification(id).await;
        self.finish("delete notification", outcome)
    }

    async fn try_delete_notification(&mut self, id: NotificationId) -> Result<CmdResult> {
        let spec = notifications::delete_request(&self.endpoints, &self.store, &self.session, id)?;
        self.send(spec).await?;
        self.store = notifications::apply_deleted(&self.store, id);
        Ok(CmdResult::default())
    }

    // --- Views ---

    /// The session user's lists, split by visibility and narrowed by `term`.
    pub fn my_lists(&self, term: &str) -> Arc<GroupedLists> {
        match self.session.user() {
            Some(owner) => self.views.grouped_lists(&self.store, owner, term),
            None => Arc::new(GroupedLists::default()),
        }
    }

    pub fn top_level_lists(&self) -> Arc<Vec<List>> {
        self.views.top_level_lists(&self.store)
    }

    pub fn public_lists(&self) -> Arc<Vec<List>> {
        self.views.public_lists(&self.store)
    }

    pub fn items_for_list(&self, id: ListId) -> Arc<Vec<ResolvedItem>> {
        self.views.items_for_list(&self.store, id)
    }

    pub fn parent_of(&self, id: ListId) -> Arc<ParentLink> {
        self.views.parent_of(&self.store, id)
    }

    pub fn suggestions(&self) -> Arc<SuggestionList> {
        self.views.suggestions(&self.store)
    }

    pub fn usage_count(&self, id: ReusableItemId) -> usize {
        self.views.usage_count(&self.store, id)
    }

    pub fn organizer_lists(&self) -> Arc<Vec<List>> {
        self.views.organizer_lists(&self.store)
    }

    pub fn organizer_slots(&self) -> Arc<HashMap<ListId, Vec<OrganizerSlot>>> {
        self.views.organizer_slots(&self.store)
    }

    pub fn notifications(&self) -> Arc<Vec<Notification>> {
        self.views.notifications(&self.store)
    }

    pub fn unread_notifications(&self) -> usize {
        notification_views::unread_count(self.store.notifications().as_map())
    }

    /// Page window for the last fetched list page.
    pub fn pager(&self, current_page: usize) -> Pager {
        Pager::new(
            self.store.lists().meta.page.count,
            current_page,
            self.config.page_size,
        )
    }

    pub fn list_as_text(&self, id: ListId) -> Result<String> {
        let list = self
            .store
            .list(&id)
            .ok_or_else(|| ForestError::not_found("list", id))?;
        Ok(export::list_as_text(
            list,
            self.store.items().as_map(),
            self.store.lists().as_map(),
        ))
    }

    pub fn can_view(&self, id: ListId) -> bool {
        self.store
            .list(&id)
            .is_some_and(|list| permissions::can_view_list(list, &self.session))
    }

    pub fn can_edit(&self, id: ListId) -> bool {
        self.store
            .list(&id)
            .is_some_and(|list| permissions::can_edit_list(list, &self.session))
    }

    pub fn can_create_list(&self) -> bool {
        permissions::can_create_list(&self.session)
    }

    pub fn check_consistency(&self) -> ConsistencyReport {
        check_consistency(&self.store)
    }
}
