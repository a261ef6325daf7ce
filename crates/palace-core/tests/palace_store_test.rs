//! Integration test: palace interaction store behaviour across a session.

use palace_core::{
    FurnitureType, LearningItem, NewTask, PalaceStore, INITIAL_PROGRESS, PROGRESS_MAX, PROGRESS_STEP,
};

fn items(n: usize) -> Vec<LearningItem> {
    (0..n)
        .map(|i| LearningItem {
            id: format!("item-{}", i),
            title: format!("Item {}", i),
            description: String::new(),
            completed: false,
            category: Some(FurnitureType::Desk),
        })
        .collect()
}

#[test]
fn completing_twice_counts_once() {
    let mut store = PalaceStore::new();
    assert!(store.complete_item("1"));
    let progress = store.progress();
    let completed = store.completed_items().to_vec();

    assert!(!store.complete_item("1"));
    assert_eq!(store.progress(), progress);
    assert_eq!(store.completed_items(), completed.as_slice());
    assert_eq!(progress, INITIAL_PROGRESS + PROGRESS_STEP);
}

#[test]
fn unknown_id_is_a_no_op() {
    let mut store = PalaceStore::new();
    let before = store.snapshot();
    assert!(!store.complete_item("does-not-exist"));
    let after = store.snapshot();
    assert_eq!(before.progress, after.progress);
    assert_eq!(before.learning_items, after.learning_items);
    assert!(after.completed_items.is_empty());
}

#[test]
fn progress_clamps_at_one_hundred() {
    let mut store = PalaceStore::with_items(items(10), Vec::new());
    for i in 0..10 {
        assert!(store.complete_item(&format!("item-{}", i)));
        assert!(store.progress() <= PROGRESS_MAX);
    }
    assert_eq!(store.progress(), 100);
    assert_eq!(store.completed_items().len(), 10);
    assert!(store.learning_items().is_empty());
}

#[test]
fn completed_items_keep_completion_order() {
    let mut store = PalaceStore::new();
    store.complete_item("4");
    store.complete_item("2");
    let ids: Vec<&str> = store.completed_items().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["4", "2"]);
    let remaining: Vec<&str> = store.learning_items().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(remaining, vec!["1", "3", "5"]);
}

#[test]
fn selecting_desk_twice_counts_two_visits() {
    let mut store = PalaceStore::new();
    store.select_furniture(Some(FurnitureType::Desk));
    let first = store.stats(FurnitureType::Desk).last_visited.unwrap();
    store.select_furniture(Some(FurnitureType::Desk));
    let stats = store.stats(FurnitureType::Desk);

    assert_eq!(stats.interactions, 2);
    assert!(stats.last_visited.unwrap() >= first);
    assert_eq!(store.selected(), Some(FurnitureType::Desk));
    assert_eq!(store.assistant_message(), FurnitureType::Desk.assistant_message());
    assert_eq!(store.stats(FurnitureType::Bed).interactions, 0);
}

#[test]
fn every_furniture_has_a_distinct_message() {
    let mut seen = std::collections::HashSet::new();
    for f in FurnitureType::ALL {
        assert!(seen.insert(f.assistant_message()));
        assert_eq!(f.as_str().parse::<FurnitureType>().unwrap(), f);
    }
}

#[test]
fn independent_sessions_do_not_share_state() {
    let mut a = PalaceStore::new();
    let b = PalaceStore::new();
    a.select_furniture(Some(FurnitureType::Chair));
    a.complete_item("5");
    a.add_pending_task(NewTask {
        title: "Repasar".into(),
        description: String::new(),
        category: None,
    });
    assert_eq!(b.stats(FurnitureType::Chair).interactions, 0);
    assert_eq!(b.progress(), INITIAL_PROGRESS);
    assert_eq!(b.pending_tasks().len(), 2);
}
