pub mod teardown_tests;

use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use duet_core::SignalMessage;
use duet_server::signaling::{ROOM_CREATED_STATUS, ROOM_JOINED_STATUS};
use duet_server::{HandshakeConfig, NegotiatorFactory, RoomRegistry, SignalingService};

use crate::utils::{MockNegotiator, MockNegotiatorFactory, SIGNAL_TIMEOUT_MS, TestPeer};

/// Stage timeout for services backed by mock negotiators (ms).
pub const TEST_STAGE_TIMEOUT_MS: u64 = 300;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_service(
    factory: Arc<dyn NegotiatorFactory>,
    stage_timeout: Duration,
) -> SignalingService {
    let handshake = HandshakeConfig {
        stage_timeout,
        candidate_buffer: 5,
    };
    let registry = RoomRegistry::with_candidate_buffer(handshake.candidate_buffer);
    SignalingService::new(registry, factory, handshake)
}

pub fn create_mock_service(factory: &MockNegotiatorFactory) -> SignalingService {
    create_service(
        Arc::new(factory.clone()),
        Duration::from_millis(TEST_STAGE_TIMEOUT_MS),
    )
}

/// Two registered participants bridged in one room, with the negotiator of
/// each side.
pub struct TestRoom {
    pub owner: TestPeer,
    pub guest: TestPeer,
    pub side_a: Arc<MockNegotiator>,
    pub side_b: Arc<MockNegotiator>,
}

/// "xavier" creates `room_id` and "yara" joins it. Consumes every status
/// message the two receive on the way.
pub async fn open_room(
    service: &SignalingService,
    factory: &MockNegotiatorFactory,
    room_id: &str,
) -> TestRoom {
    let mut owner = TestPeer::named(service, "xavier").await;
    owner.send(SignalMessage::create(room_id)).await;
    assert_eq!(owner.expect_status().await, ROOM_CREATED_STATUS);

    let side_a = factory
        .wait_for(0, SIGNAL_TIMEOUT_MS)
        .await
        .expect("Side A negotiator not created");

    let mut guest = TestPeer::named(service, "yara").await;
    guest.send(SignalMessage::join(room_id)).await;
    assert_eq!(guest.expect_status().await, ROOM_JOINED_STATUS);
    assert_eq!(
        owner.expect_status().await,
        "yara joined. Establishing connection..."
    );

    let side_b = factory
        .wait_for(1, SIGNAL_TIMEOUT_MS)
        .await
        .expect("Side B negotiator not created");

    TestRoom {
        owner,
        guest,
        side_a,
        side_b,
    }
}
