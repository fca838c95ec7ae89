mod coordinator;
mod side_a;
mod side_b;

pub use coordinator::{RELAY_CHANNEL_LABEL, RELAY_OPEN_STATUS, SETUP_FAILED_ERROR, spawn_side};
