// Esquema Diesel compartido por SQLite y Postgres.
// Tablas: sequences, sequence_steps, messages
use diesel::allow_tables_to_appear_in_same_query;
diesel::table! {
    sequences (id) {
        id -> Text,
        owner_id -> Text,
        title -> Text,
        created_at_ts -> BigInt,
    }
}
diesel::table! {
    sequence_steps (id) {
        id -> Text,
        sequence_id -> Text,
        step_number -> BigInt,
        content -> Text,
        kind -> Text,
        inserted_at_ts -> BigInt,
    }
}
diesel::table! {
    messages (id) {
        id -> Text,
        owner_id -> Text,
        role -> Text,
        content -> Text,
        timestamp_ts -> BigInt,
        inserted_at_ts -> BigInt,
    }
}
diesel::joinable!(sequence_steps -> sequences (sequence_id));
allow_tables_to_appear_in_same_query!(sequences, sequence_steps, messages);
