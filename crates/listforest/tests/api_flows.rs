use listforest::commands::{Confirmation, MessageLevel};
use listforest::effects::endpoints::ListQuery;
use listforest::effects::{Method, ScriptedTransport};
use listforest::model::{ItemId, ListId, NewList, NotificationId, ReusableItemId, SlotChoice, SlotDrafts, UserId, MAX_ITEMS};
use listforest::{ForestApp, ForestConfig, Session};
use serde_json::{json, Value};

fn slots(list: ListId, ids: &[ItemId], names: &[&str]) -> Vec<Value> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| {
            json!({
                "id": id,
                "list_id": list,
                "order": index + 1,
                "name": names.get(index).copied().unwrap_or(""),
            })
        })
        .collect()
}

fn list_json(id: ListId, name: &str, owner: UserId, parent: Option<ItemId>, ids: &[ItemId], names: &[&str]) -> Value {
    json!({
        "id": id,
        "name": name,
        "is_public": false,
        "created_by": owner,
        "parent_item": parent,
        "item": slots(id, ids, names),
    })
}

/// The organizer endpoint's projection: no owners.
fn organizer_projection(forest: &Value) -> Value {
    let mut projection = forest.clone();
    if let Some(lists) = projection.as_array_mut() {
        for list in lists {
            if let Some(fields) = list.as_object_mut() {
                fields.remove("created_by");
            }
        }
    }
    projection
}

fn new_ids() -> Vec<ItemId> {
    (0..MAX_ITEMS).map(|_| ItemId::new()).collect()
}

fn setup() -> (ForestApp<ScriptedTransport>, UserId) {
    let owner = UserId::new();
    let mut app = ForestApp::new(ScriptedTransport::new(), ForestConfig::default());
    app.login(Session::logged_in(owner, "ada", true));
    (app, owner)
}

#[tokio::test]
async fn fetching_a_page_replaces_lists_and_records_count() {
    let (mut app, owner) = setup();
    let rivers = ListId::new();
    let ids = new_ids();
    app.transport().push_json(json!({
        "count": 23, "next": "/api/v1/content/list/?offset=10", "previous": null,
        "results": [list_json(rivers, "Rivers", owner, None, &ids, &["Nile"])]
    }));

    let query = app.list_query("my", 1);
    let result = app.fetch_lists(&query).await;
    assert!(!result.has_errors());

    let request = app.transport().last_request().unwrap();
    assert_eq!(
        request.endpoint,
        "/api/v1/content/list/?&toplevel=1&listset=my&limit=10"
    );
    assert!(request.requires_auth);
    assert_eq!(app.my_lists("").private.len(), 1);
    assert_eq!(app.my_lists("riv").len(), 1);
    assert!(app.my_lists("lake").is_empty());

    let pager = app.pager(1);
    assert_eq!(pager.total_pages, 3);
    assert!(pager.has_next());
}

#[tokio::test]
async fn creating_a_list_sends_every_slot() {
    let (mut app, _) = setup();
    let reusable = ReusableItemId::new();
    let mut drafts = SlotDrafts::new().with(1, "Nile").with(2, "Amazon");
    drafts.choose(2, SlotChoice::ReusableItem { id: reusable });
    let new_list = NewList {
        slots: drafts,
        ..NewList::new("Rivers")
    };
    let created = ListId::new();
    app.transport()
        .push_json(json!({ "id": created, "name": "Rivers", "item": [] }));

    let result = app.create_list(&new_list).await;
    assert_eq!(result.affected_lists, vec![created]);
    assert_eq!(result.messages[0].level, MessageLevel::Success);

    let request = app.transport().last_request().unwrap();
    assert_eq!(request.method, Method::Post);
    let payload = request.payload.unwrap();
    assert_eq!(payload["item"].as_array().unwrap().len(), MAX_ITEMS);
    assert_eq!(payload["item"][1]["reusable_item_id"], json!(reusable));
}

#[tokio::test]
async fn moving_down_swaps_with_the_successor() {
    let (mut app, owner) = setup();
    let rivers = ListId::new();
    let ids = new_ids();
    app.transport()
        .push_json(json!([list_json(rivers, "Rivers", owner, None, &ids, &["Nile", "Amazon"])]));
    app.fetch_lists(&ListQuery::default()).await;

    app.transport().push_json(json!([
        { "id": ids[1], "list_id": rivers, "order": 1, "name": "Amazon" },
        { "id": ids[0], "list_id": rivers, "order": 2, "name": "Nile" },
    ]));
    let result = app.move_item_down(ids[0]).await;
    assert!(!result.has_errors(), "{:?}", result.messages);
    assert_eq!(result.affected_items, vec![ids[1], ids[0]]);
    assert_eq!(
        app.transport().last_request().unwrap().endpoint,
        format!("/api/v1/content/item/{}/moveup/", ids[1])
    );

    let resolved = app.items_for_list(rivers);
    assert_eq!(resolved[0].item.as_ref().unwrap().name, "Amazon");
    assert_eq!(resolved[1].item.as_ref().unwrap().name, "Nile");
    assert!(app.check_consistency().is_clean());

    // Nile now sits above a placeholder
    assert!(!app.can_move(ids[0], listforest::commands::reorder::MoveDirection::Down));
}

#[tokio::test]
async fn organizer_flow_disconnects_previous_child() {
    let (mut app, owner) = setup();
    let (y, z, x, w) = (ListId::new(), ListId::new(), ListId::new(), ListId::new());
    let (y_ids, z_ids, x_ids, w_ids) = (new_ids(), new_ids(), new_ids(), new_ids());
    let forest = json!([
        list_json(y, "Y", owner, None, &y_ids, &["y1"]),
        list_json(z, "Z", owner, None, &z_ids, &["z1", "z2"]),
        list_json(x, "X", owner, Some(y_ids[0]), &x_ids, &["x1"]),
        list_json(w, "W", owner, Some(z_ids[1]), &w_ids, &["w1"]),
    ]);
    app.transport().push_json(forest.clone());
    app.fetch_lists(&ListQuery::default()).await;

    app.transport().push_json(organizer_projection(&forest));
    let result = app.open_organizer(x).await;
    assert!(!result.has_errors(), "{:?}", result.messages);
    assert_eq!(app.organizer_lists().len(), 4);
    assert!(!app.organizer_candidates().contains(&x_ids[0]));

    // X's own item is refused
    let refused = app.select_parent_item(x_ids[0]);
    assert!(refused.has_errors());

    app.select_parent_item(z_ids[1]);
    let result = app.confirm_organizer().await;
    let Some(Confirmation::DisconnectChild { child, .. }) = result.confirmation else {
        panic!("expected a disconnect confirmation: {:?}", result);
    };
    assert_eq!(child, w);

    app.transport().push_json(json!({ "id": x, "parent_item": z_ids[1] }));
    let result = app.resolve_organizer(true).await;
    assert!(!result.has_errors(), "{:?}", result.messages);
    assert_eq!(result.affected_lists, vec![x, w]);

    let request = app.transport().last_request().unwrap();
    assert_eq!(request.method, Method::Patch);
    assert_eq!(request.payload, Some(json!({ "parent_item_id": z_ids[1] })));
    assert_eq!(app.store().list(&x).unwrap().parent_item, Some(z_ids[1]));
    assert_eq!(app.store().list(&w).unwrap().parent_item, None);
    assert_eq!(app.parent_of(x).parent_list.as_ref().unwrap().id, z);
    assert!(app.check_consistency().is_clean());
}

#[tokio::test]
async fn organizer_refuses_a_descendant() {
    let (mut app, owner) = setup();
    let (y, x) = (ListId::new(), ListId::new());
    let (y_ids, x_ids) = (new_ids(), new_ids());
    let forest = json!([
        list_json(y, "Y", owner, None, &y_ids, &["y1"]),
        list_json(x, "X", owner, Some(y_ids[0]), &x_ids, &["x1"]),
    ]);
    app.transport().push_json(forest.clone());
    app.fetch_lists(&ListQuery::default()).await;
    app.transport().push_json(organizer_projection(&forest));
    app.open_organizer(y).await;

    let result = app.select_parent_item(x_ids[0]);
    assert!(result.has_errors());
    assert!(app.errors().get("select parent item").unwrap().starts_with("Cannot move list"));
    assert_eq!(app.transport().requests().len(), 2);
}

#[tokio::test]
async fn search_results_become_suggestions() {
    let (mut app, _) = setup();
    let tiger = ReusableItemId::new();
    app.transport()
        .push_json(json!([{ "id": tiger, "name": "Tiger", "is_public": true }]));
    app.transport().push_json(json!({
        "count": 1, "next": null, "previous": null,
        "results": [{ "id": ItemId::new(), "list_id": ListId::new(), "order": 3, "name": "Tigris" }]
    }));

    app.search("tig", Some("slot-3")).await;
    let suggestions = app.suggestions();
    let names: Vec<&str> = suggestions.options.iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["tig", "tig", "Tiger", "Tigris"]);
    assert_eq!(suggestions.widget_id.as_deref(), Some("slot-3"));
    assert!(!app.transport().requests()[0].requires_auth);
}

#[tokio::test]
async fn making_a_public_reusable_item_private_forks_it() {
    let (mut app, owner) = setup();
    let rivers = ListId::new();
    let ids = new_ids();
    let nile = ReusableItemId::new();
    let mut list = list_json(rivers, "Rivers", owner, None, &ids, &["Nile"]);
    list["item"][0]["reusable_item"] = json!({ "id": nile, "name": "Nile", "is_public": true });
    app.transport().push_json(json!([list]));
    app.fetch_lists(&ListQuery::default()).await;

    let asked = app.set_reusable_item_public(nile, false, false).await;
    assert_eq!(
        asked.confirmation,
        Some(Confirmation::MakeReusableItemPrivate { reusable_item: nile })
    );

    let fork = ReusableItemId::new();
    app.transport()
        .push_json(json!({ "id": fork, "name": "Nile", "is_public": false, "created_by": owner }));
    let result = app.set_reusable_item_public(nile, false, true).await;
    assert!(!result.has_errors(), "{:?}", result.messages);
    assert_eq!(app.store().item(&ids[0]).unwrap().reusable_item_id, Some(fork));
    assert!(app.store().reusable_item(&nile).unwrap().is_public);
}

#[tokio::test]
async fn notifications_flow() {
    let (mut app, _) = setup();
    let id = NotificationId::new();
    app.transport().push_json(json!([{
        "id": id, "new": true, "unread": true,
        "created_at": "2024-03-01T10:00:00Z", "text": "Tiger was changed"
    }]));
    app.fetch_notifications().await;
    assert_eq!(app.unread_notifications(), 1);

    app.transport().push_empty();
    app.mark_notification_read(id).await;
    assert_eq!(app.unread_notifications(), 0);

    app.transport().push_empty();
    app.delete_notification(id).await;
    assert!(app.notifications().is_empty());
}

#[tokio::test]
async fn server_errors_are_recorded_per_operation() {
    let (mut app, _) = setup();
    let missing = ListId::new();
    app.transport().push_status(
        404,
        &format!("/api/v1/content/listdetail/?id={}", missing),
        None,
    );
    let result = app.fetch_list_detail(missing).await;
    assert!(result.has_errors());
    assert_eq!(
        app.errors().get("fetch list detail"),
        Some(format!("Page not found: /api/v1/content/listdetail/?id={}", missing).as_str())
    );
    assert!(!app.store().is_loading(listforest::model::EntityKind::List));
}
