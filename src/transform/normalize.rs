use serde_json::Value;
use tracing::debug;

use crate::{
    api::EntityKind,
    app_error::AppResult,
    models::{Product, User},
    transform::fields::{
        as_record, collection, float_or_default, int_or_default, required_id, text_or_default,
    },
};

/// Products at or below this price are dropped.
pub const MIN_PRODUCT_PRICE: f64 = 50.0;

/// Maps the `users` document to flat rows in source order.
pub fn normalize_users(document: &Value) -> AppResult<Vec<User>> {
    let kind = EntityKind::Users;
    let users = collection(document, kind)?
        .iter()
        .enumerate()
        .map(|(index, raw)| -> AppResult<User> {
            let record = as_record(raw, kind, index)?;
            let address = record.get("address").and_then(Value::as_object);
            let address_text = |key: &str| {
                address
                    .map(|address| text_or_default(address, key))
                    .unwrap_or_default()
            };

            Ok(User {
                user_id: required_id(record, "id", kind, index)?,
                first_name: text_or_default(record, "firstName"),
                last_name: text_or_default(record, "lastName"),
                gender: text_or_default(record, "gender"),
                age: int_or_default(record, "age"),
                street: format!("{}, {}", address_text("address"), address_text("suite")),
                city: address_text("city"),
                postal_code: address_text("postalCode"),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    debug!(rows = users.len(), "Normalized users");
    Ok(users)
}

/// Maps the `products` document to flat rows, keeping only products priced
/// above [`MIN_PRODUCT_PRICE`]. A missing price counts as zero.
///
/// Every record is validated, including the ones the price rule drops.
pub fn normalize_products(document: &Value) -> AppResult<Vec<Product>> {
    let kind = EntityKind::Products;
    let mut products = Vec::new();

    for (index, raw) in collection(document, kind)?.iter().enumerate() {
        let record = as_record(raw, kind, index)?;
        let product = Product {
            product_id: required_id(record, "id", kind, index)?,
            name: text_or_default(record, "title"),
            category: text_or_default(record, "category"),
            brand: text_or_default(record, "brand"),
            price: float_or_default(record, "price"),
        };

        if product.price > MIN_PRODUCT_PRICE {
            products.push(product);
        }
    }

    debug!(rows = products.len(), "Normalized products");
    Ok(products)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::app_error::AppError;

    #[test]
    fn user_fields_are_mapped_and_defaulted() {
        let doc = json!({
            "users": [
                {
                    "id": 1,
                    "firstName": "A",
                    "age": 30,
                    "address": { "address": "1 St", "suite": "2", "city": "X", "postalCode": "00" }
                },
                { "id": 2, "lastName": "B", "gender": "female" }
            ]
        });

        let users = normalize_users(&doc).unwrap();

        assert_eq!(
            users,
            vec![
                User {
                    user_id: 1,
                    first_name: "A".into(),
                    last_name: String::new(),
                    gender: String::new(),
                    age: 30,
                    street: "1 St, 2".into(),
                    city: "X".into(),
                    postal_code: "00".into(),
                },
                User {
                    user_id: 2,
                    first_name: String::new(),
                    last_name: "B".into(),
                    gender: "female".into(),
                    age: 0,
                    street: ", ".into(),
                    city: String::new(),
                    postal_code: String::new(),
                },
            ]
        );
    }

    #[test]
    fn street_keeps_separator_when_suite_is_missing() {
        let doc = json!({ "users": [{ "id": 4, "address": { "address": "9 Road" } }] });

        assert_eq!(normalize_users(&doc).unwrap()[0].street, "9 Road, ");
    }

    #[test]
    fn user_ids_beyond_32_bits_are_kept() {
        let doc = json!({ "users": [{ "id": 3000000000u64, "firstName": "Big", "age": 40 }] });

        let users = normalize_users(&doc).unwrap();

        assert_eq!(users[0].user_id, 3_000_000_000);
        assert_eq!(users[0].age, 40);
    }

    #[test]
    fn user_without_id_is_malformed() {
        let doc = json!({ "users": [{ "id": 1 }, { "firstName": "NoId" }] });

        let err = normalize_users(&doc).unwrap_err();

        assert!(matches!(
            err,
            AppError::MalformedInput { kind: EntityKind::Users, index: Some(1), .. }
        ));
    }

    #[test]
    fn non_object_record_is_malformed() {
        let doc = json!({ "users": [42] });

        assert!(matches!(
            normalize_users(&doc),
            Err(AppError::MalformedInput { index: Some(0), .. })
        ));
    }

    #[test]
    fn products_at_or_below_threshold_are_dropped() {
        let doc = json!({
            "products": [
                { "id": 1, "title": "Cheap", "price": 9.99 },
                { "id": 2, "title": "Edge", "price": 50 },
                { "id": 3, "title": "Phone", "category": "smartphones", "brand": "Acme", "price": 549.0 },
                { "id": 4, "title": "NoPrice" },
                { "id": 5, "title": "Odd", "price": "cheap" },
                { "id": 6, "title": "Just over", "price": 50.01 }
            ]
        });

        let products = normalize_products(&doc).unwrap();

        assert_eq!(
            products,
            vec![
                Product {
                    product_id: 3,
                    name: "Phone".into(),
                    category: "smartphones".into(),
                    brand: "Acme".into(),
                    price: 549.0,
                },
                Product {
                    product_id: 6,
                    name: "Just over".into(),
                    category: String::new(),
                    brand: String::new(),
                    price: 50.01,
                },
            ]
        );
    }

    #[test]
    fn filtered_product_without_id_still_fails() {
        let doc = json!({ "products": [{ "title": "Cheap", "price": 1.0 }] });

        assert!(normalize_products(&doc).is_err());
    }

    #[test]
    fn empty_collections_normalize_to_empty_tables() {
        assert!(normalize_users(&json!({})).unwrap().is_empty());
        assert!(normalize_products(&json!({ "products": [] })).unwrap().is_empty());
    }

    #[test]
    fn normalization_is_repeatable() {
        let doc = json!({
            "products": [
                { "id": 1, "title": "A", "price": 99.5 },
                { "id": 2, "title": "B", "price": 51 }
            ]
        });

        assert_eq!(normalize_products(&doc).unwrap(), normalize_products(&doc).unwrap());
    }
}
