use listforest::commands::organizer::{apply_reparent, ConfirmStep, Organizer};
use listforest::commands::reorder::apply_move_up;
use listforest::commands::Confirmation;
use listforest::effects::ResponseBody;
use listforest::model::{Item, ItemId, ListId, ReusableItem, UserId, MAX_ITEMS};
use listforest::normalize::normalize_value;
use listforest::store::doctor::{check_consistency, ConsistencyIssue};
use listforest::store::EntityStore;
use listforest::views::lists::group_by_visibility;
use listforest::views::suggestions::{suggestions_for, Suggestion};
use listforest::views::tree::{ancestors, resolve_items_for_list};
use serde_json::{json, Value};

/// One list as the server sends it: every slot expanded, unnamed slots empty.
struct ListSpec {
    id: ListId,
    name: &'static str,
    owner: UserId,
    is_public: bool,
    parent_item: Option<ItemId>,
    item_ids: Vec<ItemId>,
    names: Vec<&'static str>,
}

impl ListSpec {
    fn new(name: &'static str, owner: UserId, names: &[&'static str]) -> Self {
        Self {
            id: ListId::new(),
            name,
            owner,
            is_public: false,
            parent_item: None,
            item_ids: (0..MAX_ITEMS).map(|_| ItemId::new()).collect(),
            names: names.to_vec(),
        }
    }

    fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    fn under(mut self, parent: ItemId) -> Self {
        self.parent_item = Some(parent);
        self
    }

    fn slot(&self, order: usize) -> ItemId {
        self.item_ids[order - 1]
    }

    fn to_json(&self) -> Value {
        let items: Vec<Value> = self
            .item_ids
            .iter()
            .enumerate()
            .map(|(index, id)| {
                json!({
                    "id": id,
                    "list_id": self.id,
                    "order": index + 1,
                    "name": self.names.get(index).copied().unwrap_or(""),
                })
            })
            .collect();
        json!({
            "id": self.id,
            "name": self.name,
            "is_public": self.is_public,
            "created_by": self.owner,
            "parent_item": self.parent_item,
            "item": items,
        })
    }

    /// The organizer endpoint leaves owners out.
    fn to_organizer_json(&self) -> Value {
        let mut value = self.to_json();
        if let Some(fields) = value.as_object_mut() {
            fields.remove("created_by");
        }
        value
    }
}

fn load(lists: &[&ListSpec]) -> EntityStore {
    let payload = Value::Array(lists.iter().map(|l| l.to_json()).collect());
    let normalized = normalize_value(&payload).unwrap();
    EntityStore::new().merge_entities(normalized.entities)
}

#[test]
fn normalized_payload_resolves_back_to_the_same_lists() {
    let owner = UserId::new();
    let rivers = ListSpec::new("Rivers", owner, &["Nile", "Amazon", "", "Congo"]);
    let towns = ListSpec::new("Nile towns", owner, &["Aswan", "Luxor"]).under(rivers.slot(1));
    let store = load(&[&rivers, &towns]);

    assert!(check_consistency(&store).is_clean());
    let list = store.list(&rivers.id).unwrap();
    let resolved = resolve_items_for_list(list, store.items().as_map(), store.lists().as_map());
    let names: Vec<&str> = resolved
        .iter()
        .map(|slot| slot.item.as_ref().map(|i| i.name.as_str()).unwrap_or("?"))
        .collect();
    assert_eq!(&names[..4], &["Nile", "Amazon", "", "Congo"]);
    assert_eq!(resolved.len(), MAX_ITEMS);
    assert_eq!(resolved[0].child_list.as_ref().unwrap().id, towns.id);
    for (index, slot) in resolved.iter().enumerate() {
        assert_eq!(slot.item.as_ref().unwrap().order, index + 1);
    }
}

#[test]
fn nested_child_list_payload_is_flattened() {
    let owner = UserId::new();
    let rivers = ListSpec::new("Rivers", owner, &["Nile"]);
    let towns = ListSpec::new("Nile towns", owner, &["Aswan"]);
    let mut payload = rivers.to_json();
    payload["item"][0]["child_list"] = towns.to_json();

    let normalized = normalize_value(&payload).unwrap();
    let store = EntityStore::new().merge_entities(normalized.entities);
    assert_eq!(store.lists().len(), 2);
    assert_eq!(store.list(&towns.id).unwrap().parent_item, Some(rivers.slot(1)));
    assert_eq!(store.items().len(), 2 * MAX_ITEMS);
}

#[test]
fn swapping_back_restores_the_original_slots() {
    let owner = UserId::new();
    let rivers = ListSpec::new("Rivers", owner, &["Nile", "Amazon", "Congo"]);
    let store = load(&[&rivers]);
    let (nile, amazon) = (rivers.slot(1), rivers.slot(2));
    let pair = |first: ItemId, first_name: &str, second: ItemId, second_name: &str| {
        ResponseBody::Json(json!([
            { "id": first, "list_id": rivers.id, "order": 1, "name": first_name },
            { "id": second, "list_id": rivers.id, "order": 2, "name": second_name },
        ]))
    };

    let (swapped, moved) = apply_move_up(&store, &pair(amazon, "Amazon", nile, "Nile")).unwrap();
    assert_eq!(moved, [amazon, nile]);
    assert_eq!(swapped.list(&rivers.id).unwrap().item_ids[0], amazon);

    let (restored, _) = apply_move_up(&swapped, &pair(nile, "Nile", amazon, "Amazon")).unwrap();
    assert_eq!(
        restored.list(&rivers.id).unwrap().item_ids,
        store.list(&rivers.id).unwrap().item_ids
    );
    for id in [nile, amazon] {
        assert_eq!(restored.item(&id).unwrap().order, store.item(&id).unwrap().order);
    }
    assert!(check_consistency(&restored).is_clean());
}

#[test]
fn grouping_covers_every_owned_list_once() {
    let owner = UserId::new();
    let stranger = UserId::new();
    let a = ListSpec::new("Alpha", owner, &[]);
    let b = ListSpec::new("beta", owner, &[]).public();
    let c = ListSpec::new("Gamma", owner, &[]).public();
    let d = ListSpec::new("Theirs", stranger, &[]).public();
    let store = load(&[&a, &b, &c, &d]);

    let grouped = group_by_visibility(store.lists().values(), owner);
    assert_eq!(grouped.len(), 3);
    let public: Vec<&str> = grouped.public.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(public, vec!["beta", "Gamma"]);
    assert_eq!(grouped.private[0].id, a.id);
    assert!(grouped
        .public
        .iter()
        .all(|l| !grouped.private.iter().any(|p| p.id == l.id)));
}

#[test]
fn every_walk_terminates_and_cycles_are_reported() {
    let owner = UserId::new();
    let a = ListSpec::new("A", owner, &["a"]);
    let b = ListSpec::new("B", owner, &["b"]).under(a.slot(1));
    let c = ListSpec::new("C", owner, &["c"]).under(b.slot(1));
    let store = load(&[&a, &b, &c]);
    for id in [a.id, b.id, c.id] {
        let walk = ancestors(id, store.lists().as_map(), store.items().as_map());
        assert!(walk.terminates());
        assert!(walk.chain.len() < store.lists().len());
    }

    // A hangs under C's item: A -> C -> B -> A
    let looped = ListSpec {
        parent_item: Some(c.slot(1)),
        ..ListSpec::new("A", owner, &["a"])
    };
    let looped = ListSpec {
        id: a.id,
        item_ids: a.item_ids.clone(),
        ..looped
    };
    let store = load(&[&looped, &b, &c]);
    let walk = ancestors(a.id, store.lists().as_map(), store.items().as_map());
    assert!(!walk.terminates());
    let report = check_consistency(&store);
    assert!(report
        .issues
        .iter()
        .any(|issue| matches!(issue, ConsistencyIssue::Cycle { .. })));
}

#[test]
fn suggestions_put_text_first_then_reusable_then_items() {
    let list = ListId::new();
    let reusable = vec![ReusableItem::new("Tiger")];
    let mut linked = Item::new(list, 2, "Tiger moth");
    linked.reusable_item_id = Some(reusable[0].id);
    let items = vec![Item::new(list, 1, "Tigris"), linked];

    let result = suggestions_for("tig", None, &reusable, &items);
    let names: Vec<&str> = result.options.iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["tig", "tig", "Tiger", "Tigris"]);
    assert!(matches!(result.options[0], Suggestion::Text { .. }));
    assert!(matches!(result.options[1], Suggestion::NewReusableItem { .. }));
    assert!(matches!(result.options[2], Suggestion::ReusableItem { .. }));
    assert!(matches!(result.options[3], Suggestion::Item { .. }));
}

#[test]
fn reparenting_onto_an_occupied_item_disconnects_the_old_child() {
    let owner = UserId::new();
    let y = ListSpec::new("Y", owner, &["y1"]);
    let z = ListSpec::new("Z", owner, &["z1", "z2", "z3", "z4", "z5", "z6", "z7", "z8", "z9"]);
    let x = ListSpec::new("X", owner, &["x1"]).under(y.slot(1));
    let w = ListSpec::new("W", owner, &["w1"]).under(z.slot(9));
    let store = load(&[&y, &z, &x, &w]);
    let payload = Value::Array(
        [&y, &z, &x, &w].iter().map(|l| l.to_organizer_json()).collect(),
    );
    let store = store.receive_organizer_data(normalize_value(&payload).unwrap().entities);

    let mut organizer = Organizer::new();
    organizer.open(&store, x.id).unwrap();
    organizer.select_parent_item(&store, z.slot(9)).unwrap();
    let ConfirmStep::NeedsConfirmation(Confirmation::DisconnectChild { child, .. }) =
        organizer.confirm(&store).unwrap()
    else {
        panic!("expected a disconnect confirmation");
    };
    assert_eq!(child, w.id);
    let plan = organizer.resolve(true).unwrap();

    let body = ResponseBody::Json(json!({ "id": x.id, "parent_item": z.slot(9) }));
    let next = apply_reparent(&store, &plan, &body).unwrap();
    assert_eq!(next.list(&x.id).unwrap().parent_item, Some(z.slot(9)));
    assert_eq!(next.list(&w.id).unwrap().parent_item, None);
    assert_eq!(next.list(&y.id), store.list(&y.id));
    assert!(check_consistency(&next).is_clean());
}
