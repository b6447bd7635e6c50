use diesel::prelude::Insertable;
use serde::{Deserialize, Serialize};

/// Fixed name and column list of a table handed to storage or the warehouse.
///
/// `COLUMNS` must list the struct fields in declaration order; the text codec
/// writes it as the header row and serde emits values in the same order.
pub trait TableSchema {
    const NAME: &'static str;
    const COLUMNS: &'static [&'static str];
}

// Flat tables

#[derive(Insertable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::users_table)]
pub struct User {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub age: i64,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

impl TableSchema for User {
    const NAME: &'static str = "users_table";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "first_name",
        "last_name",
        "gender",
        "age",
        "street",
        "city",
        "postal_code",
    ];
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::products_table)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub category: String,
    pub brand: String,
    #[serde(serialize_with = "crate::tabular::plain_float")]
    pub price: f64,
}

impl TableSchema for Product {
    const NAME: &'static str = "products_table";
    const COLUMNS: &'static [&'static str] = &["product_id", "name", "category", "brand", "price"];
}

/// One line item of a cart. `total_cart_value` is the whole cart's total,
/// repeated on every row of that cart.
#[derive(Insertable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::carts_table)]
pub struct CartItem {
    pub cart_id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[serde(serialize_with = "crate::tabular::plain_float")]
    pub price: f64,
    #[serde(serialize_with = "crate::tabular::plain_float")]
    pub total_cart_value: f64,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

impl TableSchema for CartItem {
    const NAME: &'static str = "carts_table";
    const COLUMNS: &'static [&'static str] = &[
        "cart_id",
        "user_id",
        "product_id",
        "quantity",
        "price",
        "total_cart_value",
    ];
}

// Derived tables

#[derive(Insertable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::user_summary)]
pub struct UserSummary {
    pub user_id: i64,
    pub first_name: String,
    #[serde(serialize_with = "crate::tabular::plain_float")]
    pub total_spent: f64,
    pub total_items: i64,
    pub age: i64,
    pub city: String,
}

impl TableSchema for UserSummary {
    const NAME: &'static str = "user_summary";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "first_name",
        "total_spent",
        "total_items",
        "age",
        "city",
    ];
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::category_summary)]
pub struct CategorySummary {
    pub category: String,
    #[serde(serialize_with = "crate::tabular::plain_float")]
    pub total_sales: f64,
    pub total_items_sold: i64,
}

impl TableSchema for CategorySummary {
    const NAME: &'static str = "category_summary";
    const COLUMNS: &'static [&'static str] = &["category", "total_sales", "total_items_sold"];
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::cart_details)]
pub struct CartDetail {
    pub cart_id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[serde(serialize_with = "crate::tabular::plain_float")]
    pub price: f64,
    #[serde(serialize_with = "crate::tabular::plain_float")]
    pub total_cart_value: f64,
    pub first_name: String,
    pub last_name: String,
    pub product_name: String,
    pub category: String,
    pub brand: String,
}

impl TableSchema for CartDetail {
    const NAME: &'static str = "cart_details";
    const COLUMNS: &'static [&'static str] = &[
        "cart_id",
        "user_id",
        "product_id",
        "quantity",
        "price",
        "total_cart_value",
        "first_name",
        "last_name",
        "product_name",
        "category",
        "brand",
    ];
}
