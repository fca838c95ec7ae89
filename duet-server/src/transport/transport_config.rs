use duet_core::IceServerConfig;

/// ICE servers handed to every negotiator the server creates.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Gather loopback candidates too; only useful when both ends of the
    /// connection live in this process and no other interface is routable.
    pub include_loopback: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun("stun:stun.l.google.com:19302")],
            include_loopback: false,
        }
    }
}
