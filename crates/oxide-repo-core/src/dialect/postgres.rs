//! Postgres dialect.

use super::{Dialect, Placeholder};

impl Dialect {
    /// Postgres: `$N` placeholders, double-quoted identifiers, `RETURNING`
    /// for inserted identities, native arrays and JSON.
    #[must_use]
    pub const fn postgres() -> Self {
        Self {
            name: "postgres",
            placeholder: Placeholder::Numbered,
            quote: Some('"'),
            insert_returns_identity: true,
            native_containers: true,
            offset_needs_limit: false,
        }
    }
}
