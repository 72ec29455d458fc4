//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Accounts. `email` is unique and stored lower-cased.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Text,
        first_name -> Varchar,
        last_name -> Varchar,
        phone -> Nullable<Varchar>,
        role -> Text,
        diocese_id -> Nullable<Uuid>,
        parish_id -> Nullable<Uuid>,
        active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    dioceses (id) {
        id -> Uuid,
        name -> Varchar,
        bishop_id -> Nullable<Uuid>,
        active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Parishes. Latitude and longitude are both set or both null.
    parishes (id) {
        id -> Uuid,
        diocese_id -> Uuid,
        name -> Varchar,
        address -> Nullable<Varchar>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Role invitations. Only the SHA-256 digest of the token is stored.
    invites (id) {
        id -> Uuid,
        token_digest -> Bpchar,
        email -> Varchar,
        role -> Text,
        parish_id -> Nullable<Uuid>,
        diocese_id -> Nullable<Uuid>,
        invited_by -> Uuid,
        status -> Text,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    priest_parish_requests (id) {
        id -> Uuid,
        priest_id -> Uuid,
        parish_id -> Uuid,
        message -> Nullable<Text>,
        status -> Text,
        reviewed_by -> Nullable<Uuid>,
        reviewed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// At most one active row per priest (partial unique index).
    priest_parish_history (id) {
        id -> Uuid,
        priest_id -> Uuid,
        parish_id -> Uuid,
        start_date -> Timestamptz,
        end_date -> Nullable<Timestamptz>,
        active -> Bool,
    }
}

diesel::table! {
    confession_slots (id) {
        id -> Uuid,
        priest_id -> Uuid,
        parish_id -> Uuid,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        status -> Text,
        notes -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    confession_bands (id) {
        id -> Uuid,
        priest_id -> Uuid,
        parish_id -> Uuid,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        capacity -> Int4,
        booked_count -> Int4,
        status -> Text,
        recurrence -> Text,
        recurrence_until -> Nullable<Timestamptz>,
        series_id -> Nullable<Uuid>,
        notes -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Bookings. Exactly one of `slot_id` and `band_id` is set.
    confessions (id) {
        id -> Uuid,
        faithful_id -> Uuid,
        priest_id -> Uuid,
        slot_id -> Nullable<Uuid>,
        band_id -> Nullable<Uuid>,
        scheduled_time -> Timestamptz,
        status -> Text,
        notes -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(parishes -> dioceses (diocese_id));
diesel::joinable!(priest_parish_history -> parishes (parish_id));
diesel::joinable!(confession_slots -> parishes (parish_id));
diesel::joinable!(confession_bands -> parishes (parish_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    dioceses,
    parishes,
    invites,
    priest_parish_requests,
    priest_parish_history,
    confession_slots,
    confession_bands,
    confessions,
);
