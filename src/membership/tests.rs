//! Membership Module Tests
//!
//! ## Test Scopes
//! - **Parsing**: the comma-separated form used by configuration and view changes.
//! - **Lookup**: positions and membership checks that placement depends on.
//! - **Serialization**: the view travels as a plain JSON list.

#[cfg(test)]
mod tests {
    use crate::membership::types::View;

    // ============================================================
    // PARSING TESTS
    // ============================================================

    #[test]
    fn test_parse_keeps_order() {
        let view = View::parse("10.0.0.3:13800,10.0.0.1:13800,10.0.0.2:13800");

        assert_eq!(
            view.addresses(),
            &["10.0.0.3:13800", "10.0.0.1:13800", "10.0.0.2:13800"]
        );
    }

    #[test]
    fn test_parse_trims_and_skips_blanks() {
        let view = View::parse(" a:1 , ,b:1,");

        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0), Some("a:1"));
        assert_eq!(view.get(1), Some("b:1"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(View::parse("").is_empty());
        assert!(View::parse(" , ").is_empty());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let view = View::parse("a:1,b:1,c:1");

        assert_eq!(View::parse(&view.to_string()), view);
    }

    // ============================================================
    // LOOKUP TESTS
    // ============================================================

    #[test]
    fn test_index_of() {
        let view = View::parse("a:1,b:1,c:1");

        assert_eq!(view.index_of("c:1"), Some(2));
        assert_eq!(view.index_of("z:1"), None);
        assert!(view.contains("a:1"));
    }

    #[test]
    fn test_union_keeps_new_order_then_removed_nodes() {
        let new_view = View::parse("a:1,c:1");
        let old_view = View::parse("a:1,b:1");

        assert_eq!(new_view.union(&old_view), vec!["a:1", "c:1", "b:1"]);
    }

    // ============================================================
    // SERIALIZATION TESTS
    // ============================================================

    #[test]
    fn test_view_serializes_as_list() {
        let view = View::parse("a:1,b:1");

        let json = serde_json::to_string(&view).expect("Serialization failed");
        assert_eq!(json, r#"["a:1","b:1"]"#);

        let restored: View = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(restored, view);
    }
}
