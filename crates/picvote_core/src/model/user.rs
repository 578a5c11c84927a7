//! Session user model.

use serde::{Deserialize, Serialize};

/// Identity of the single local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub handle: String,
    /// Avatar image URL.
    pub avatar: String,
}
