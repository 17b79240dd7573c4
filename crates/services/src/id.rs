//! Resource ID helpers.

use appwrite_transfer::ID_UNIQUE;

/// Lets the server generate the ID.
pub fn unique() -> String {
    ID_UNIQUE.to_string()
}

/// Uses a caller-chosen ID.
pub fn custom(id: impl Into<String>) -> String {
    id.into()
}
