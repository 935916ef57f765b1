//! End-to-end catalog lifecycles against `InMemoryEventLog`.

use std::collections::HashSet;
use std::sync::Arc;

use rehydrate_catalog::application::command_handlers::{
    handle_create_item, handle_rename_item, handle_retire_item,
};
use rehydrate_catalog::application::query_handlers::get_item_by_id;
use rehydrate_catalog::application::store::CatalogStore;
use rehydrate_catalog::domain::aggregates::CatalogItem;
use rehydrate_catalog::domain::commands::{CreateItem, RenameItem, RetireItem};
use rehydrate_core::aggregate::AggregateRoot;
use rehydrate_core::append::Appender;
use rehydrate_core::error::DomainError;
use rehydrate_core::log::{EventLog, ExpectedStreamState};
use rehydrate_core::replay::Replayer;
use rehydrate_event_store::in_memory_event_log::InMemoryEventLog;
use rehydrate_test_support::FixedClock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn create_command(item_id: Uuid) -> CreateItem {
    CreateItem {
        correlation_id: Uuid::new_v4(),
        item_id,
        name: "Oak chair".into(),
        sku: "CH-001".into(),
    }
}

#[tokio::test]
async fn test_committed_changes_replay_to_the_same_state() {
    // Arrange
    let log = Arc::new(InMemoryEventLog::new());
    let clock = FixedClock::default();
    let cancel = CancellationToken::new();
    let appender = Appender::new(log.clone());
    let replayer = Replayer::new(log.clone(), CatalogItem::new);

    let mut item = CatalogItem::new(Uuid::new_v4());
    item.create("Oak chair", "CH-001", &clock).unwrap();
    item.rename("Walnut chair", &clock).unwrap();
    item.retire("discontinued", &clock).unwrap();

    // Act
    let committed = appender
        .commit(&mut item, ExpectedStreamState::NoStream, &cancel)
        .await
        .unwrap();
    let replayed = replayer.replay(item.id, None, &cancel).await.unwrap();

    // Assert
    assert_eq!(committed.stream_version, 3);
    assert_eq!(replayed, item);
    assert_eq!(replayed.version(), 3);
}

#[tokio::test]
async fn test_command_handlers_drive_full_lifecycle() {
    let store = CatalogStore::new(Arc::new(InMemoryEventLog::new()));
    let clock = FixedClock::default();
    let cancel = CancellationToken::new();
    let item_id = Uuid::new_v4();

    handle_create_item(&create_command(item_id), &clock, &store, &cancel)
        .await
        .unwrap();
    handle_rename_item(
        &RenameItem {
            correlation_id: Uuid::new_v4(),
            item_id,
            name: "Walnut chair".into(),
        },
        &clock,
        &store,
        &cancel,
    )
    .await
    .unwrap();
    let retired = handle_retire_item(
        &RetireItem {
            correlation_id: Uuid::new_v4(),
            item_id,
            reason: "discontinued".into(),
        },
        &clock,
        &store,
        &cancel,
    )
    .await
    .unwrap();

    let view = get_item_by_id(item_id, &store, &cancel).await.unwrap();
    assert_eq!(retired.stream_version, 3);
    assert_eq!(view.name.as_deref(), Some("Walnut chair"));
    assert!(view.retired);
    assert_eq!(view.version, 3);
}

#[tokio::test]
async fn test_second_create_conflicts_and_recovers_by_replaying() {
    // Arrange
    let log = Arc::new(InMemoryEventLog::new());
    let clock = FixedClock::default();
    let cancel = CancellationToken::new();
    let appender = Appender::new(log.clone());
    let replayer = Replayer::new(log.clone(), CatalogItem::new);
    let item_id = Uuid::new_v4();

    let mut first = CatalogItem::new(item_id);
    first.create("Oak chair", "CH-001", &clock).unwrap();
    let mut second = CatalogItem::new(item_id);
    second.create("Pine chair", "CH-002", &clock).unwrap();

    appender
        .commit(&mut first, ExpectedStreamState::NoStream, &cancel)
        .await
        .unwrap();

    // Act
    let err = appender
        .commit(&mut second, ExpectedStreamState::NoStream, &cancel)
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(
        err,
        DomainError::ConcurrencyConflict {
            expected: ExpectedStreamState::NoStream,
            actual: 1,
            ..
        }
    ));
    assert_eq!(second.pending_changes().len(), 1);

    // The loser replays, reapplies its intent as a rename and commits again.
    let mut rebuilt = replayer.replay(item_id, None, &cancel).await.unwrap();
    rebuilt.rename("Pine chair", &clock).unwrap();
    let committed = appender
        .commit(&mut rebuilt, ExpectedStreamState::Exact(1), &cancel)
        .await
        .unwrap();

    assert_eq!(committed.stream_version, 2);
    let stream = log.read(item_id, None).await.unwrap();
    let types: Vec<&str> = stream.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["catalog.item_created", "catalog.item_renamed"]);
}

#[tokio::test]
async fn test_stale_writer_conflicts_after_concurrent_commit() {
    let log = Arc::new(InMemoryEventLog::new());
    let store = CatalogStore::new(log.clone());
    let clock = FixedClock::default();
    let cancel = CancellationToken::new();
    let appender = Appender::new(log.clone());
    let item_id = Uuid::new_v4();
    handle_create_item(&create_command(item_id), &clock, &store, &cancel)
        .await
        .unwrap();

    let mut a = store.load(item_id, &cancel).await.unwrap();
    let mut b = store.load(item_id, &cancel).await.unwrap();
    a.rename("Walnut chair", &clock).unwrap();
    b.rename("Birch chair", &clock).unwrap();

    appender
        .commit(&mut a, ExpectedStreamState::Exact(1), &cancel)
        .await
        .unwrap();
    let result = appender
        .commit(&mut b, ExpectedStreamState::Exact(1), &cancel)
        .await;

    assert!(matches!(
        result,
        Err(DomainError::ConcurrencyConflict { actual: 2, .. })
    ));
    assert_eq!(log.read(item_id, None).await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_renames_all_land_with_retries() {
    // Arrange
    const WRITERS: u32 = 8;
    let log = Arc::new(InMemoryEventLog::new());
    let store = Arc::new(CatalogStore::new(log.clone()).with_max_attempts(WRITERS + 1));
    let cancel = CancellationToken::new();
    let item_id = Uuid::new_v4();
    handle_create_item(
        &create_command(item_id),
        &FixedClock::default(),
        &store,
        &cancel,
    )
    .await
    .unwrap();

    // Act
    let mut tasks = Vec::new();
    for writer in 0..WRITERS {
        let store = Arc::clone(&store);
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            let command = RenameItem {
                correlation_id: Uuid::new_v4(),
                item_id,
                name: format!("Chair #{writer}"),
            };
            handle_rename_item(&command, &FixedClock::default(), &store, &cancel).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // Assert
    let stream = log.read(item_id, None).await.unwrap();
    assert_eq!(stream.len(), 1 + WRITERS as usize);
    let versions: Vec<u64> = stream.iter().map(|e| e.version).collect();
    assert_eq!(versions, (1..=u64::from(1 + WRITERS)).collect::<Vec<_>>());
    let ids: HashSet<Uuid> = stream.iter().map(|e| e.event_id).collect();
    assert_eq!(ids.len(), stream.len());

    let view = get_item_by_id(item_id, &store, &cancel).await.unwrap();
    assert_eq!(view.version, u64::from(1 + WRITERS));
}
