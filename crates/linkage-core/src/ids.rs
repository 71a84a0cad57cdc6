//! ID prefix constants and temporary id helpers.
//!
//! Persisted ids are generated by the store as `{prefix}-{8 hex}`. Optimistic
//! rows use client-side temporary ids that never collide with persisted ones
//! because of the distinct `temp` prefix.

pub const PREFIX_LINK: &str = "lnk";
pub const PREFIX_AUDIT: &str = "aud";

/// All persisted id prefixes.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_LINK, PREFIX_AUDIT];

/// Prefix for client-assigned ids of optimistic rows.
pub const PREFIX_TEMP: &str = "temp";

/// Build a temporary id from a unix-millis timestamp.
///
/// `index` is `Some` when several rows are projected by one operation,
/// producing `temp-<millis>-<index>`; a single row gets `temp-<millis>`.
#[must_use]
pub fn temp_id(timestamp_millis: i64, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("{PREFIX_TEMP}-{timestamp_millis}-{i}"),
        None => format!("{PREFIX_TEMP}-{timestamp_millis}"),
    }
}

/// Whether `id` was assigned by the client for an optimistic row.
#[must_use]
pub fn is_temp_id(id: &str) -> bool {
    id.strip_prefix(PREFIX_TEMP)
        .is_some_and(|rest| rest.starts_with('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_temp_id_has_no_index() {
        assert_eq!(temp_id(1_700_000_000_000, None), "temp-1700000000000");
    }

    #[test]
    fn indexed_temp_id() {
        assert_eq!(temp_id(42, Some(3)), "temp-42-3");
    }

    #[test]
    fn temp_id_detection() {
        assert!(is_temp_id("temp-42"));
        assert!(is_temp_id(&temp_id(7, Some(0))));
        assert!(!is_temp_id("lnk-a3f8b2c1"));
        assert!(!is_temp_id("temporary"));
    }
}
