//! In-memory relational engine for the three derived tables.
//!
//! Joins are exact inner joins. Groups are emitted in order of first
//! appearance while scanning cart items, and ordering is a stable sort on the
//! declared key only, so ties keep that emission order and repeated runs over
//! the same input produce identical output.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    app_error::{AppError, AppResult},
    models::{CartDetail, CartItem, CategorySummary, Product, TableSchema, User, UserSummary},
    storage::{PROCESSED_CARTS, PROCESSED_PRODUCTS, PROCESSED_USERS, Storage},
    tabular,
};

/// The three normalized tables the engine consumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTables {
    pub users: Vec<User>,
    pub products: Vec<Product>,
    pub cart_items: Vec<CartItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summaries {
    pub user_summary: Vec<UserSummary>,
    pub category_summary: Vec<CategorySummary>,
    pub cart_details: Vec<CartDetail>,
}

impl FlatTables {
    /// Reads the processed tables back from storage. Any absent table fails
    /// the whole load.
    pub fn load<S: Storage>(storage: &S) -> AppResult<Self> {
        Ok(Self {
            users: load_table::<User, S>(storage, PROCESSED_USERS)?,
            products: load_table::<Product, S>(storage, PROCESSED_PRODUCTS)?,
            cart_items: load_table::<CartItem, S>(storage, PROCESSED_CARTS)?,
        })
    }
}

fn load_table<T, S>(storage: &S, name: &str) -> AppResult<Vec<T>>
where
    T: TableSchema + serde::de::DeserializeOwned,
    S: Storage,
{
    let bytes = storage
        .get(name)?
        .ok_or(AppError::AggregationInputMissing(T::NAME))?;
    tabular::decode(&bytes)
}

pub fn aggregate(tables: &FlatTables) -> Summaries {
    let summaries = Summaries {
        user_summary: user_summary(&tables.users, &tables.cart_items),
        category_summary: category_summary(&tables.products, &tables.cart_items),
        cart_details: cart_details(&tables.users, &tables.products, &tables.cart_items),
    };

    debug!(
        user_summary = summaries.user_summary.len(),
        category_summary = summaries.category_summary.len(),
        cart_details = summaries.cart_details.len(),
        "Aggregated"
    );
    summaries
}

/// Spend per user, highest first. Users without cart items are absent.
pub fn user_summary(users: &[User], cart_items: &[CartItem]) -> Vec<UserSummary> {
    let users_by_id = index_by(users, |user| user.user_id);
    let mut groups: HashMap<(i64, &str, i64, &str), usize> = HashMap::new();
    let mut summary: Vec<UserSummary> = Vec::new();

    for item in cart_items {
        for user in users_by_id.get(&item.user_id).into_iter().flatten() {
            let key = (user.user_id, user.first_name.as_str(), user.age, user.city.as_str());
            let slot = *groups.entry(key).or_insert_with(|| {
                summary.push(UserSummary {
                    user_id: user.user_id,
                    first_name: user.first_name.clone(),
                    total_spent: 0.0,
                    total_items: 0,
                    age: user.age,
                    city: user.city.clone(),
                });
                summary.len() - 1
            });

            let row = &mut summary[slot];
            row.total_spent += item.line_total();
            row.total_items += item.quantity;
        }
    }

    summary.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
    summary
}

/// Sales per product category, highest first. Cart items whose product was
/// filtered out of the products table do not count.
pub fn category_summary(products: &[Product], cart_items: &[CartItem]) -> Vec<CategorySummary> {
    let products_by_id = index_by(products, |product| product.product_id);
    let mut groups: HashMap<&str, usize> = HashMap::new();
    let mut summary: Vec<CategorySummary> = Vec::new();

    for item in cart_items {
        for product in products_by_id.get(&item.product_id).into_iter().flatten() {
            let slot = *groups.entry(product.category.as_str()).or_insert_with(|| {
                summary.push(CategorySummary {
                    category: product.category.clone(),
                    total_sales: 0.0,
                    total_items_sold: 0,
                });
                summary.len() - 1
            });

            let row = &mut summary[slot];
            row.total_sales += item.line_total();
            row.total_items_sold += item.quantity;
        }
    }

    summary.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    summary
}

/// Cart items joined to their user and product, ordered by cart then product.
pub fn cart_details(users: &[User], products: &[Product], cart_items: &[CartItem]) -> Vec<CartDetail> {
    let users_by_id = index_by(users, |user| user.user_id);
    let products_by_id = index_by(products, |product| product.product_id);
    let mut details = Vec::new();

    for item in cart_items {
        for user in users_by_id.get(&item.user_id).into_iter().flatten() {
            for product in products_by_id.get(&item.product_id).into_iter().flatten() {
                details.push(CartDetail {
                    cart_id: item.cart_id,
                    user_id: item.user_id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                    total_cart_value: item.total_cart_value,
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    product_name: product.name.clone(),
                    category: product.category.clone(),
                    brand: product.brand.clone(),
                });
            }
        }
    }

    details.sort_by_key(|detail| (detail.cart_id, detail.product_id));
    details
}

/// Groups rows by join key, keeping every row that shares a key in table
/// order so duplicate keys fan out the way a relational join does.
fn index_by<T>(rows: &[T], key: impl Fn(&T) -> i64) -> HashMap<i64, Vec<&T>> {
    let mut index: HashMap<i64, Vec<&T>> = HashMap::new();
    for row in rows {
        index.entry(key(row)).or_default().push(row);
    }
    index
}
