//! SQLite dialect.

use super::{Dialect, Placeholder};

impl Dialect {
    /// SQLite: `?` placeholders, bare identifiers, last-insert-id lookup,
    /// no container support.
    #[must_use]
    pub const fn sqlite() -> Self {
        Self {
            name: "sqlite",
            placeholder: Placeholder::Positional,
            quote: None,
            insert_returns_identity: false,
            native_containers: false,
            offset_needs_limit: true,
        }
    }
}
