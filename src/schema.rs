//! Diesel table definitions for the gateway's embedded store.
//!
//! Monetary columns are stored as integer minor units (cents); see
//! [`crate::rest::money`] for the REST-boundary conversion.

diesel::table! {
    users (id) {
        id -> Integer,
        username -> Text,
        password -> Text,
        subscription_tier -> Text,
        tier_expires_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    categories (id) {
        id -> Integer,
        user_id -> Integer,
        name -> Text,
        active -> Bool,
    }
}

diesel::table! {
    products (id) {
        id -> Integer,
        user_id -> Integer,
        category_id -> Integer,
        name -> Text,
        price_cents -> BigInt,
        active -> Bool,
    }
}

diesel::table! {
    transaction_headers (id) {
        id -> Integer,
        user_id -> Integer,
        code -> Text,
        created_at -> Timestamp,
        status -> Text,
        subtotal_cents -> BigInt,
        discount_total_cents -> BigInt,
        tax_total_cents -> BigInt,
        total_cents -> BigInt,
        paid_amount_cents -> BigInt,
        change_amount_cents -> BigInt,
        payment_method -> Text,
    }
}

diesel::table! {
    transaction_items (id) {
        id -> Integer,
        header_id -> Integer,
        product_id -> Nullable<Integer>,
        item_name -> Text,
        unit_price_cents -> BigInt,
        quantity -> Integer,
        subtotal_cents -> BigInt,
        line_total_cents -> BigInt,
    }
}

diesel::table! {
    cash_movements (id) {
        id -> Integer,
        header_id -> Integer,
        amount_cents -> BigInt,
        kind -> Text,
    }
}

diesel::table! {
    stock_sales (id) {
        id -> Integer,
        header_id -> Integer,
        product_id -> Integer,
        qty -> Integer,
        kind -> Text,
    }
}

diesel::table! {
    scan_audits (id) {
        id -> Integer,
        user_id -> Integer,
        device_id -> Text,
        session_id -> Text,
        frame_seq -> BigInt,
        detection_count -> Integer,
        outcome -> Text,
        created_at -> Timestamp,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    categories,
    products,
    transaction_headers,
    transaction_items,
    cash_movements,
    stock_sales,
    scan_audits,
);
