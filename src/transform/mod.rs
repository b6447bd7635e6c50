//! Raw source documents to flat rows.

pub mod fields;
pub mod flatten;
pub mod normalize;

pub use flatten::flatten_carts;
pub use normalize::{normalize_products, normalize_users};
