use serde::{Deserialize, Serialize};

/// Immutable identity snapshot as returned by the identity API or the
/// bridge. Never mutated by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}
