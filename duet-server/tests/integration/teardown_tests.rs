use std::sync::Arc;
use std::time::Duration;

use duet_core::{Payload, RoomId, SignalMessage};
use duet_server::SessionState;
use duet_server::signaling::ROOM_CREATED_STATUS;

use crate::integration::{create_mock_service, init_tracing, open_room};
use crate::utils::{MockNegotiatorFactory, SIGNAL_TIMEOUT_MS, TestPeer, wait_until};

#[tokio::test]
async fn test_disconnect_notifies_other_participant_once() {
    init_tracing();

    let factory = MockNegotiatorFactory::new();
    let service = create_mock_service(&factory);
    let mut room = open_room(&service, &factory, "r1").await;

    room.owner.disconnect();
    room.owner.disconnect();

    let notice = room.guest.recv().await.expect("No disconnect notice");
    assert_eq!(
        notice.payload,
        Payload::PeerDisconnect("xavier has disconnected.".to_string())
    );
    assert!(service.registry().is_empty());
    assert_eq!(room.owner.session.state(), SessionState::Terminated);

    room.guest.disconnect();

    room.guest.assert_silent().await;
    room.owner.assert_silent().await;
}

#[tokio::test]
async fn test_teardown_closes_negotiators_and_stops_routines() {
    init_tracing();

    let factory = MockNegotiatorFactory::new();
    let service = create_mock_service(&factory);
    let mut room = open_room(&service, &factory, "r1").await;
    room.side_a.wait_for_remote(SIGNAL_TIMEOUT_MS).await.unwrap();

    let registered = service.registry().lookup(&RoomId::from("r1")).unwrap();
    let weak = Arc::downgrade(&registered);
    drop(registered);

    room.guest.disconnect();

    let (side_a, side_b) = (room.side_a.clone(), room.side_b.clone());
    assert!(
        wait_until(SIGNAL_TIMEOUT_MS, || side_a.is_closed() && side_b.is_closed()).await,
        "Negotiators were not closed"
    );
    assert!(
        wait_until(SIGNAL_TIMEOUT_MS, || {
            side_a.events_released() && side_b.events_released()
        })
        .await,
        "Event pumps still running"
    );
    assert!(
        wait_until(SIGNAL_TIMEOUT_MS, || weak.upgrade().is_none()).await,
        "Handshake routines still hold the room"
    );
}

#[tokio::test]
async fn test_owner_leaving_before_join_releases_waiting_routine() {
    init_tracing();

    let factory = MockNegotiatorFactory::new();
    let service = create_mock_service(&factory);

    let mut owner = TestPeer::named(&service, "xavier").await;
    owner.send(SignalMessage::create("r1")).await;
    assert_eq!(owner.expect_status().await, ROOM_CREATED_STATUS);

    let side_a = factory.wait_for(0, SIGNAL_TIMEOUT_MS).await.unwrap();
    let weak = Arc::downgrade(&service.registry().lookup(&RoomId::from("r1")).unwrap());

    owner.disconnect();

    assert!(service.registry().is_empty());
    assert!(
        wait_until(SIGNAL_TIMEOUT_MS, || weak.upgrade().is_none()).await,
        "Side A routine still waiting for a peer"
    );
    assert!(wait_until(SIGNAL_TIMEOUT_MS, || side_a.is_closed()).await);
    owner.assert_silent().await;
}

#[tokio::test]
async fn test_stale_disconnect_keeps_newer_room() {
    init_tracing();

    let factory = MockNegotiatorFactory::new();
    let service = create_mock_service(&factory);
    let mut room = open_room(&service, &factory, "r1").await;

    room.owner.disconnect();
    let notice = room.guest.recv().await.expect("No disconnect notice");
    assert!(matches!(notice.payload, Payload::PeerDisconnect(_)));

    let mut newcomer = TestPeer::named(&service, "zed").await;
    newcomer.send(SignalMessage::create("r1")).await;
    assert_eq!(newcomer.expect_status().await, ROOM_CREATED_STATUS);

    room.guest.disconnect();

    let current = service
        .registry()
        .lookup(&RoomId::from("r1"))
        .expect("Newer room was deleted");
    assert_eq!(
        current.side_of(newcomer.link().peer_id()),
        Some(duet_core::Side::A)
    );
    assert!(!current.is_closed());
    newcomer.assert_silent().await;
}

#[tokio::test]
async fn test_negotiators_created_after_teardown_are_closed() {
    init_tracing();

    let factory = MockNegotiatorFactory::new();
    let service = create_mock_service(&factory);

    let rooms = 20;
    for i in 0..rooms {
        let mut owner = TestPeer::named(&service, "xavier").await;
        owner.send(SignalMessage::create(format!("r{i}"))).await;
        owner.disconnect();
    }
    assert!(service.registry().is_empty());

    let last = factory
        .wait_for(rooms - 1, SIGNAL_TIMEOUT_MS)
        .await
        .expect("Every room should still create its negotiator");
    assert!(wait_until(SIGNAL_TIMEOUT_MS, || last.is_closed()).await);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let created = factory.created().await;
    assert_eq!(created.len(), rooms);
    for negotiator in created {
        assert!(
            wait_until(SIGNAL_TIMEOUT_MS, || negotiator.is_closed()).await,
            "Negotiator {} left open after teardown",
            negotiator.id
        );
    }
}
