// Mirrors migrations/2025-01-01-000000_create_tables. The warehouse tables carry
// no constraints; the keys below only satisfy `table!`.

diesel::table! {
    users_table (user_id) {
        user_id -> Int8,
        first_name -> Text,
        last_name -> Text,
        gender -> Text,
        age -> Int8,
        street -> Text,
        city -> Text,
        postal_code -> Text,
    }
}

diesel::table! {
    products_table (product_id) {
        product_id -> Int8,
        name -> Text,
        category -> Text,
        brand -> Text,
        price -> Float8,
    }
}

diesel::table! {
    carts_table (cart_id, product_id) {
        cart_id -> Int8,
        user_id -> Int8,
        product_id -> Int8,
        quantity -> Int8,
        price -> Float8,
        total_cart_value -> Float8,
    }
}

diesel::table! {
    user_summary (user_id) {
        user_id -> Int8,
        first_name -> Text,
        total_spent -> Float8,
        total_items -> Int8,
        age -> Int8,
        city -> Text,
    }
}

diesel::table! {
    category_summary (category) {
        category -> Text,
        total_sales -> Float8,
        total_items_sold -> Int8,
    }
}

diesel::table! {
    cart_details (cart_id, product_id) {
        cart_id -> Int8,
        user_id -> Int8,
        product_id -> Int8,
        quantity -> Int8,
        price -> Float8,
        total_cart_value -> Float8,
        first_name -> Text,
        last_name -> Text,
        product_name -> Text,
        category -> Text,
        brand -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users_table,
    products_table,
    carts_table,
    user_summary,
    category_summary,
    cart_details,
);
