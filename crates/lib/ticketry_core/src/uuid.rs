// Helper for generating UUIDv7 (timestamp-sortable UUIDs)
//
// Every entity in the tracker is ordered by creation time somewhere in the
// API (projects, tickets, comments and notifications are all listed
// newest-first), so all ids are generated app-side as UUIDv7 rather than
// relying on gen_random_uuid() (v4) in PostgreSQL.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuidv7_is_valid() {
        let id = uuidv7();
        assert_eq!(id.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn uuidv7_is_monotonic() {
        let a = uuidv7();
        let b = uuidv7();
        // UUIDv7 embeds timestamp — later IDs sort after earlier ones
        assert!(b >= a);
    }
}
