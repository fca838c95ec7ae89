use anyhow::{Result, bail};
use duet_core::{Payload, SignalMessage};
use duet_server::{SignalingLink, SignalingService, SignalingSession};
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for a single expected signal (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 2000;

/// How long a connection must stay quiet to count as silent (ms).
pub const SILENCE_MS: u64 = 150;

/// One signaling connection driven directly, without a socket.
pub struct TestPeer {
    pub session: SignalingSession,
    rx: mpsc::UnboundedReceiver<SignalMessage>,
}

impl TestPeer {
    pub fn connect(service: &SignalingService) -> Self {
        let (link, rx) = SignalingLink::channel();
        Self {
            session: service.open_session(link),
            rx,
        }
    }

    /// Connects and registers under `name`, consuming the `registered` reply.
    pub async fn named(service: &SignalingService, name: &str) -> Self {
        let mut peer = Self::connect(service);
        peer.send(SignalMessage::register(name)).await;
        let reply = peer.recv().await.expect("No reply to register");
        assert!(matches!(reply.payload, Payload::Registered));
        peer
    }

    pub fn link(&self) -> &SignalingLink {
        self.session.link()
    }

    pub async fn send(&mut self, msg: SignalMessage) {
        self.session.handle(msg).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.session.handle_text(text).await;
    }

    pub fn disconnect(&mut self) {
        self.session.cleanup();
    }

    pub async fn recv(&mut self) -> Result<SignalMessage> {
        match tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), self.rx.recv()).await
        {
            Ok(Some(msg)) => Ok(msg),
            Ok(None) => bail!("Signal channel closed"),
            Err(_) => bail!("Timeout waiting for signal"),
        }
    }

    pub async fn expect_status(&mut self) -> String {
        match self.recv().await.expect("No status received").payload {
            Payload::Status(text) => text,
            other => panic!("Expected status, got {:?}", other),
        }
    }

    pub async fn expect_error(&mut self) -> String {
        match self.recv().await.expect("No error received").payload {
            Payload::Error(text) => text,
            other => panic!("Expected error, got {:?}", other),
        }
    }

    /// Skips messages until one satisfies `pred`.
    pub async fn recv_matching(
        &mut self,
        timeout_ms: u64,
        pred: impl Fn(&SignalMessage) -> bool,
    ) -> Result<SignalMessage> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let msg = match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(msg)) => msg,
                Ok(None) => bail!("Signal channel closed"),
                Err(_) => bail!("Timeout waiting for matching signal"),
            };
            if pred(&msg) {
                return Ok(msg);
            }
            tracing::debug!("[TestPeer] skipping {:?}", msg.kind());
        }
    }

    pub async fn assert_silent(&mut self) {
        if let Ok(Some(msg)) =
            tokio::time::timeout(Duration::from_millis(SILENCE_MS), self.rx.recv()).await
        {
            panic!("Expected no signal, got {:?}", msg);
        }
    }
}

/// Polls `check` until it holds or `timeout_ms` elapses.
pub async fn wait_until(timeout_ms: u64, check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while !check() {
        if tokio::time::Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    true
}
