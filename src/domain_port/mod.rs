// store

mod token_store;

pub use token_store::*;

// remote adapters

mod identity_client;
mod session_bridge;

pub use identity_client::*;
pub use session_bridge::*;
