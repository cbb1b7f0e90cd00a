mod identity_client_fake;
mod session_bridge_fake;

pub use identity_client_fake::*;
pub use session_bridge_fake::*;
