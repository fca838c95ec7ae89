use crate::transport::TransportConfig;
use duet_core::IceServerConfig;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";
const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CANDIDATE_BUFFER: usize = 5;

/// Limits applied to the per-room handshake.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Bound on each handshake stage once both participants are present.
    pub stage_timeout: Duration,
    /// Capacity of each candidate-relay channel.
    pub candidate_buffer: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
            candidate_buffer: DEFAULT_CANDIDATE_BUFFER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub transport: TransportConfig,
    pub handshake: HandshakeConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let addr = env::var("DUET_ADDR")
            .ok()
            .and_then(|a| a.parse().ok())
            .unwrap_or(defaults.addr);
        let static_dir = env::var("DUET_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let stun_url = env::var("STUN_URL").unwrap_or_else(|_| DEFAULT_STUN_URL.to_owned());
        let mut ice_servers = vec![IceServerConfig::stun(stun_url)];
        if let Ok(turn_url) = env::var("TURN_URL") {
            ice_servers.push(IceServerConfig {
                urls: vec![turn_url],
                username: env::var("TURN_USERNAME").ok(),
                credential: env::var("TURN_CREDENTIAL").ok(),
            });
        }

        let stage_timeout = env::var("DUET_STAGE_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.handshake.stage_timeout);
        let candidate_buffer = env::var("DUET_CANDIDATE_BUFFER")
            .ok()
            .and_then(|n| n.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.handshake.candidate_buffer);

        Self {
            addr,
            static_dir,
            transport: TransportConfig {
                ice_servers,
                include_loopback: defaults.transport.include_loopback,
            },
            handshake: HandshakeConfig {
                stage_timeout,
                candidate_buffer,
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            transport: TransportConfig::default(),
            handshake: HandshakeConfig::default(),
        }
    }
}
