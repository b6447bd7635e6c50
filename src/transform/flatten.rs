use serde_json::Value;
use tracing::debug;

use crate::{
    api::EntityKind,
    app_error::{AppError, AppResult},
    models::CartItem,
    transform::fields::{Record, as_record, collection, float_or_default, int_or_default, required_id},
};

struct LineItem {
    product_id: i64,
    quantity: i64,
    price: f64,
}

/// Expands every cart into one row per line item.
///
/// The cart total is summed over the cart's complete line-item list before any
/// row is emitted, then copied onto each of its rows. Carts without line
/// items produce no rows. Ids are not checked against the other tables.
pub fn flatten_carts(document: &Value) -> AppResult<Vec<CartItem>> {
    let kind = EntityKind::Carts;
    let mut rows = Vec::new();

    for (index, raw) in collection(document, kind)?.iter().enumerate() {
        let cart = as_record(raw, kind, index)?;
        let cart_id = required_id(cart, "id", kind, index)?;
        let user_id = required_id(cart, "userId", kind, index)?;
        let items = line_items(cart, index)?;

        let total_cart_value: f64 = items
            .iter()
            .map(|item| item.quantity as f64 * item.price)
            .sum();

        rows.extend(items.into_iter().map(|item| CartItem {
            cart_id,
            user_id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            total_cart_value,
        }));
    }

    debug!(rows = rows.len(), "Flattened carts");
    Ok(rows)
}

fn line_items(cart: &Record, index: usize) -> AppResult<Vec<LineItem>> {
    let kind = EntityKind::Carts;
    let raw_items = match cart.get("products") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(AppError::malformed(kind, index, "`products` is not an array"));
        }
    };

    raw_items
        .iter()
        .enumerate()
        .map(|(position, raw)| -> AppResult<LineItem> {
            let item = as_record(raw, kind, index).map_err(|err| in_line_item(err, position))?;
            Ok(LineItem {
                product_id: required_id(item, "id", kind, index)
                    .map_err(|err| in_line_item(err, position))?,
                quantity: int_or_default(item, "quantity"),
                price: float_or_default(item, "price"),
            })
        })
        .collect()
}

/// Names the offending line item, counted from zero like records are.
fn in_line_item(err: AppError, position: usize) -> AppError {
    match err {
        AppError::MalformedInput {
            kind,
            index,
            reason,
        } => AppError::MalformedInput {
            kind,
            index,
            reason: format!("line item {position}: {reason}"),
        },
        other => other,
    }
}
