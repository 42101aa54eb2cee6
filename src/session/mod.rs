mod controller;
mod error;
mod types;

pub use controller::{SessionController, DEFAULT_POLL_INTERVAL};
pub use error::SessionError;
pub use types::SessionStatus;
