//! Unit tests for the pool coordinator

use worker_pool::{PoolCoordinator, WorkerEvent, WorkerMessage};

fn event(worker: u64, message: WorkerMessage) -> WorkerEvent {
    WorkerEvent { worker, message }
}

#[tokio::test]
async fn all_ready_waits_for_every_worker() {
    let mut coordinator = PoolCoordinator::new();
    let sender = coordinator.sender();
    coordinator.expect_ready(1);
    coordinator.expect_ready(2);

    sender.send(event(2, WorkerMessage::Ready)).unwrap();
    sender.send(event(1, WorkerMessage::Ready)).unwrap();

    coordinator.all_ready().await.unwrap();
    assert_eq!(coordinator.pending_ready(), 0);
}

#[tokio::test]
async fn all_ready_with_nothing_pending_returns_immediately() {
    let mut coordinator = PoolCoordinator::new();
    coordinator.all_ready().await.unwrap();
    coordinator.all_done().await.unwrap();
}

#[tokio::test]
async fn done_while_awaiting_ready_is_unknown_message() {
    let mut coordinator = PoolCoordinator::new();
    let sender = coordinator.sender();
    coordinator.expect_ready(1);
    sender.send(event(1, WorkerMessage::Done)).unwrap();

    let err = coordinator.all_ready().await.unwrap_err();
    assert!(err.to_string().contains("Unknown worker message: done"));
    assert_eq!(coordinator.pending_ready(), 0);
}

#[tokio::test]
async fn event_from_unregistered_worker_is_rejected() {
    let mut coordinator = PoolCoordinator::new();
    let sender = coordinator.sender();
    coordinator.expect_done(1);
    sender.send(event(9, WorkerMessage::Done)).unwrap();

    let err = coordinator.all_done().await.unwrap_err();
    assert!(err.to_string().contains("from worker 9"));
}

#[tokio::test]
async fn failure_aborts_all_done() {
    let mut coordinator = PoolCoordinator::new();
    let sender = coordinator.sender();
    coordinator.expect_done(1);
    coordinator.expect_done(2);
    sender.send(event(1, WorkerMessage::Done)).unwrap();
    sender
        .send(event(2, WorkerMessage::Failed("bad input".to_string())))
        .unwrap();

    let err = coordinator.all_done().await.unwrap_err();
    assert!(err.to_string().contains("worker 2 failed: bad input"));
}
