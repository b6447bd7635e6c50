use std::fmt;

use serde_json::Value;

use crate::app_error::AppResult;

pub mod http;

pub use http::HttpSource;

/// The three entity kinds served by the source API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Users,
    Products,
    Carts,
}

impl EntityKind {
    /// Top-level key holding the record array, which doubles as the URL path.
    pub fn collection_key(self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Products => "products",
            EntityKind::Carts => "carts",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_key())
    }
}

/// Retrieves one raw JSON document per entity kind.
pub trait Source {
    fn fetch(&self, kind: EntityKind) -> impl Future<Output = AppResult<Value>> + Send;
}
