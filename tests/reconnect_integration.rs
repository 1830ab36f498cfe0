//! Reconnection behavior of the connection manager and client, driven by a
//! channel-backed connector on a paused clock.

mod common;

use common::{make_frame, ChannelConnector};
use observatory::client::TelemetryClient;
use observatory::stream::{
    ConnectionManager, ConnectionState, ConnectionStatus, StreamError, StreamEvent,
};
use std::time::Duration;
use tokio::time::timeout;

const DELAY: Duration = Duration::from_millis(4000);

#[tokio::test(start_paused = true)]
async fn test_close_schedules_exactly_one_reconnect() {
    let (connector, senders) = ChannelConnector::with_connections(2);
    let mut manager = ConnectionManager::new(connector.clone(), "test://producer", DELAY);

    manager.connect();
    assert_eq!(manager.next_event().await, StreamEvent::Connected);

    let mut senders = senders.into_iter();
    drop(senders.next());
    assert_eq!(
        manager.next_event().await,
        StreamEvent::Disconnected { error: None }
    );
    assert_eq!(manager.status(), ConnectionStatus::offline(None));
    assert!(manager.reconnect_pending());

    // Nothing happens before the delay has elapsed
    assert!(timeout(DELAY - Duration::from_millis(1), manager.next_event())
        .await
        .is_err());
    assert_eq!(connector.attempts(), 1);

    assert_eq!(manager.next_event().await, StreamEvent::Reconnecting);
    assert_eq!(manager.next_event().await, StreamEvent::Connected);
    assert_eq!(connector.attempts(), 2);
    assert_eq!(manager.reconnect_attempts(), 1);
    assert!(!manager.reconnect_pending());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_before_timer_prevents_attempt() {
    let (connector, senders) = ChannelConnector::with_connections(2);
    let mut manager = ConnectionManager::new(connector.clone(), "test://producer", DELAY);

    manager.connect();
    manager.next_event().await;
    drop(senders);
    manager.next_event().await;
    assert!(manager.reconnect_pending());

    manager.disconnect();
    assert!(!manager.reconnect_pending());

    assert!(timeout(DELAY * 10, manager.next_event()).await.is_err());
    assert_eq!(connector.attempts(), 1);
    assert_eq!(manager.reconnect_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_refused_attempts_keep_retrying_with_message() {
    let (connector, _senders) = ChannelConnector::with_connections(0);
    let mut manager = ConnectionManager::new(connector.clone(), "test://producer", DELAY);
    let status = manager.subscribe();

    manager.connect();
    for round in 1..=3 {
        match manager.next_event().await {
            StreamEvent::Errored { message } => {
                assert!(message.contains("connection refused"));
            }
            other => panic!("round {}: unexpected event {:?}", round, other),
        }
        assert_eq!(status.borrow().state, ConnectionState::Error);
        assert!(!manager.reconnect_pending());

        match manager.next_event().await {
            StreamEvent::Disconnected { error: Some(message) } => {
                assert!(message.contains("connection refused"));
            }
            other => panic!("round {}: unexpected event {:?}", round, other),
        }
        let current = status.borrow().clone();
        assert_eq!(current.state, ConnectionState::Offline);
        assert!(current.error.is_some());
        assert!(current.state.is_degraded());

        if round < 3 {
            assert_eq!(manager.next_event().await, StreamEvent::Reconnecting);
        }
    }

    assert_eq!(connector.attempts(), 3);
    assert_eq!(manager.reconnect_attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_surfaces_message_then_recovers() {
    let (connector, senders) = ChannelConnector::with_connections(2);
    let mut manager = ConnectionManager::new(connector.clone(), "test://producer", DELAY);

    manager.connect();
    manager.next_event().await;
    senders[0]
        .send(Err(StreamError::Transport("connection reset".to_string())))
        .unwrap();

    assert_eq!(
        manager.next_event().await,
        StreamEvent::Errored {
            message: "transport error: connection reset".to_string()
        }
    );
    assert_eq!(
        manager.status(),
        ConnectionStatus::error("transport error: connection reset")
    );

    assert_eq!(
        manager.next_event().await,
        StreamEvent::Disconnected {
            error: Some("transport error: connection reset".to_string())
        }
    );
    assert_eq!(
        manager.status(),
        ConnectionStatus::offline(Some("transport error: connection reset".to_string()))
    );
    assert!(manager.reconnect_pending());

    // Manual reconnect skips the timer and clears the message
    manager.connect();
    assert!(!manager.reconnect_pending());
    assert_eq!(manager.status(), ConnectionStatus::connecting());
    assert_eq!(manager.next_event().await, StreamEvent::Connected);
    assert_eq!(connector.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_connect_while_online_is_noop() {
    let (connector, _senders) = ChannelConnector::with_connections(1);
    let mut manager = ConnectionManager::new(connector.clone(), "test://producer", DELAY);

    manager.connect();
    manager.next_event().await;
    manager.connect();
    manager.connect();

    assert!(manager.is_online());
    assert_eq!(connector.attempts(), 1);
    assert_eq!(manager.status(), ConnectionStatus::online());
}

#[tokio::test(start_paused = true)]
async fn test_frames_before_close_are_folded_first() {
    let (connector, senders) = ChannelConnector::with_connections(1);
    let (client, handle) =
        TelemetryClient::with_connector(connector, "test://producer", DELAY, false);
    let task = client.spawn();

    let mut status = handle.status();
    status.wait_for(|s| s.is_online()).await.unwrap();

    let mut senders = senders.into_iter();
    let sender = senders.next().unwrap();
    for i in 0..5 {
        sender.send(Ok(make_frame(&format!("t{}", i), 10.0 * f64::from(i)))).unwrap();
    }
    drop(sender);

    status
        .wait_for(|s| s.state == ConnectionState::Offline)
        .await
        .unwrap();
    let view = handle.current_view();
    assert_eq!(view.stats.accepted, 5);
    assert_eq!(view.latest.as_ref().unwrap().timestamp, "t4");

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_history_survives_outage() {
    let (connector, senders) = ChannelConnector::with_connections(2);
    let (client, handle) =
        TelemetryClient::with_connector(connector.clone(), "test://producer", DELAY, false);
    let task = client.spawn();
    let mut status = handle.status();
    let mut view = handle.view();

    let mut senders = senders.into_iter();
    let first = senders.next().unwrap();
    let second = senders.next().unwrap();

    status.wait_for(|s| s.is_online()).await.unwrap();
    first.send(Ok(make_frame("t1", 25.0))).unwrap();
    view.wait_for(|v| v.stats.accepted == 1).await.unwrap();
    drop(first);

    status
        .wait_for(|s| s.state == ConnectionState::Offline)
        .await
        .unwrap();
    assert!(handle.current_view().latest.is_some());

    status.wait_for(|s| s.is_online()).await.unwrap();
    second.send(Ok(make_frame("t2", 75.0))).unwrap();
    let current = view.wait_for(|v| v.stats.accepted == 2).await.unwrap().clone();
    assert_eq!(
        current.series(observatory::history::SeriesKey::GpuUtilization(0)),
        &[25.0, 75.0]
    );
    assert_eq!(connector.attempts(), 2);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_handle_disconnect_then_reconnect() {
    let (connector, _senders) = ChannelConnector::with_connections(2);
    let (client, handle) =
        TelemetryClient::with_connector(connector.clone(), "test://producer", DELAY, false);
    let task = client.spawn();
    let mut status = handle.status();

    status.wait_for(|s| s.is_online()).await.unwrap();
    handle.disconnect().await.unwrap();
    assert_eq!(handle.current_status(), ConnectionStatus::offline(None));

    tokio::time::sleep(DELAY * 3).await;
    assert_eq!(connector.attempts(), 1);

    handle.reconnect().await.unwrap();
    status.wait_for(|s| s.is_online()).await.unwrap();
    assert_eq!(connector.attempts(), 2);

    handle.shutdown();
    task.await.unwrap();
}
