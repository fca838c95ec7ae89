pub mod signal_helpers;

pub use mock_negotiator::*;
pub use signal_helpers::*;
