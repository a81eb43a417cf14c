use std::sync::Arc;
use std::time::Duration;

use d_leader::CoordinatorError;
use d_leader::CoordinatorState;
use d_leader::Error;
use d_leader::LeaseStore;
use d_leader::MemoryLeaseStore;
use d_leader::MemoryMutexStore;
use d_leader::MutexStore;
use tracing_test::traced_test;

use crate::common::*;

#[tokio::test(start_paused = true)]
async fn test_destroy_while_leading_releases_before_returning() {
    let store = Arc::new(MemoryLeaseStore::new());
    let tally = Arc::new(LeaderTally::default());
    let candidate = TrackingCandidate::new("A", &tally);
    let node = lease_node(&store, &candidate);
    node.start().await.unwrap();
    assert!(wait_until(SETTLE, || node.is_leader()).await);

    node.destroy().await.unwrap();

    assert_eq!(candidate.callbacks(), vec![Callback::Granted, Callback::Revoked]);
    assert_eq!(store.get("it/r").await.unwrap(), None);
    assert_eq!(node.state(), CoordinatorState::Stopped);

    tokio::time::sleep(SETTLE).await;
    assert_eq!(candidate.callbacks().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_unlocks_mutex() {
    let store = Arc::new(MemoryMutexStore::new());
    let tally = Arc::new(LeaderTally::default());
    let candidate = TrackingCandidate::new("A", &tally);
    let node = lock_node(&store, &candidate);
    node.start().await.unwrap();
    assert!(wait_until(SETTLE, || node.is_leader()).await);
    assert!(store.is_locked("it/r").await.unwrap());

    node.destroy().await.unwrap();

    assert!(!store.is_locked("it/r").await.unwrap());
    assert_eq!(candidate.count(Callback::Revoked), 1);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_repeated_start_and_stop_are_harmless() {
    let store = Arc::new(MemoryLeaseStore::new());
    let tally = Arc::new(LeaderTally::default());
    let candidate = TrackingCandidate::new("A", &tally);
    let node = lease_node(&store, &candidate);

    node.start().await.unwrap();
    node.start().await.unwrap();
    assert!(wait_until(SETTLE, || node.is_leader()).await);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(candidate.count(Callback::Granted), 1);

    node.stop().await.unwrap();
    node.stop().await.unwrap();
    assert!(!node.is_running());
    assert_eq!(candidate.callbacks(), vec![Callback::Granted, Callback::Revoked]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_start_spawns_one_control_loop() {
    let store = Arc::new(MemoryLeaseStore::new());
    let tally = Arc::new(LeaderTally::default());
    let candidate = TrackingCandidate::new("A", &tally);
    let node = lease_node(&store, &candidate);

    let (first, second) = tokio::join!(node.start(), node.start());
    first.unwrap();
    second.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(candidate.count(Callback::Granted), 1);
    node.destroy().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_destroyed_coordinator_cannot_restart() {
    let store = Arc::new(MemoryLeaseStore::new());
    let tally = Arc::new(LeaderTally::default());
    let node = lease_node(&store, &TrackingCandidate::new("A", &tally));

    node.destroy().await.unwrap();

    assert!(matches!(
        node.start().await,
        Err(Error::Coordinator(CoordinatorError::Destroyed))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_stopping_follower_leaves_leader_alone() {
    let store = Arc::new(MemoryLeaseStore::new());
    let tally = Arc::new(LeaderTally::default());
    let leader = lease_node(&store, &TrackingCandidate::new("A", &tally));
    let follower_candidate = TrackingCandidate::new("B", &tally);
    let follower = lease_node(&store, &follower_candidate);
    leader.start().await.unwrap();
    assert!(wait_until(SETTLE, || leader.is_leader()).await);
    follower.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    follower.destroy().await.unwrap();

    assert!(follower_candidate.callbacks().is_empty());
    assert!(leader.is_leader());
    assert_eq!(store.get("it/r").await.unwrap().as_deref(), Some("A"));
    leader.destroy().await.unwrap();
}
