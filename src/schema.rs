//! Handwritten Diesel schema declarations used by model structs.
//!
//! Migrations define the actual tables and constraints. This module only
//! provides `diesel::table!` declarations so we can derive Insertable/Queryable
//! in a type-safe way without running `diesel print-schema`.

diesel::table! {
    users (id) {
        id -> BigInt,
        name -> Text,
        email -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    homes (id) {
        id -> BigInt,
        user_id -> BigInt,
        address -> Text,
        city -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    appliances (id) {
        id -> BigInt,
        home_id -> BigInt,
        appliance_type -> Text,
        brand -> Nullable<Text>,
        status -> Text, // ON | OFF | IDLE
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

// Append-mostly meter readings, one row per appliance sample
diesel::table! {
    usage_records (id) {
        id -> BigInt,
        appliance_id -> BigInt,
        recorded_at -> Timestamptz,
        energy_kwh -> Double,
    }
}

// Reference data: dates on which usage writes are refused
diesel::table! {
    holidays (id) {
        id -> BigInt,
        name -> Text,
        holiday_date -> Date,
        description -> Nullable<Text>,
    }
}

// Flat append log written exclusively by the write gate; never updated
diesel::table! {
    audit_log (id) {
        id -> BigInt,
        logged_at -> Timestamptz,
        actor -> Text,
        affected_table -> Text,
        operation -> Text, // INSERT | UPDATE | DELETE
        record_id -> Nullable<BigInt>,
        status -> Text, // ALLOWED | DENIED
        comment -> Text,
    }
}

diesel::joinable!(homes -> users (user_id));
diesel::joinable!(appliances -> homes (home_id));
diesel::joinable!(usage_records -> appliances (appliance_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    homes,
    appliances,
    usage_records,
    holidays,
    audit_log,
);
