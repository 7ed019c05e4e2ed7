//! Diesel table definitions for the local store.

diesel::table! {
    apiaries (id) {
        id -> Text,
        user_id -> Nullable<Text>,
        name -> Text,
        latitude -> Nullable<Double>,
        longitude -> Nullable<Double>,
        note -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    hives (id) {
        id -> Text,
        user_id -> Nullable<Text>,
        apiary_id -> Text,
        code -> Text,
        queen_installed_at -> Nullable<Text>,
        note -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    inspections (id) {
        id -> Text,
        user_id -> Nullable<Text>,
        hive_id -> Text,
        visited_at -> Text,
        queen_seen -> Bool,
        eggs_seen -> Bool,
        frames_bees -> Integer,
        stores_kg -> Double,
        note -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    sync_outbox (id) {
        id -> BigInt,
        entity -> Text,
        entity_id -> Text,
        op -> Text,
        payload -> Text,
        retry_count -> Integer,
        next_retry_at -> Nullable<Text>,
        last_error -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    sync_engine_state (id) {
        id -> Integer,
        last_push_at -> Nullable<Text>,
        last_pull_at -> Nullable<Text>,
        last_error -> Nullable<Text>,
        consecutive_failures -> Integer,
        last_cycle_status -> Nullable<Text>,
        last_cycle_duration_ms -> Nullable<BigInt>,
    }
}

diesel::joinable!(hives -> apiaries (apiary_id));
diesel::joinable!(inspections -> hives (hive_id));

diesel::allow_tables_to_appear_in_same_query!(apiaries, hives, inspections);
