// Identity and edge ids are UUIDv7 so that documents sort by creation time
// when the store falls back to insertion order.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a new document id as a string.
pub fn new_object_id() -> String {
    uuidv7().to_string()
}
