mod session;
mod signaling_link;
mod signaling_service;
mod ws_handler;

pub use session::*;
pub use signaling_link::*;
pub use signaling_service::*;
pub use ws_handler::*;
