/// Contract-level checks for the upload/listing API shapes
///
/// Note: These are self-contained tests of the wire-format rules.
/// End-to-end coverage lives in the in-crate router tests.

#[cfg(test)]
mod tests {
    /// The pagination contract: all four derived fields come from one
    /// count, computed with ceiling division.
    fn paginate(page: u32, page_size: u32, total: u64) -> (u32, bool, bool) {
        let total_pages = ((total + page_size as u64 - 1) / page_size as u64) as u32;
        (total_pages, page < total_pages, page > 1 && total > 0)
    }

    #[test]
    fn test_total_pages_is_ceiling_division() {
        assert_eq!(paginate(1, 10, 0).0, 0);
        assert_eq!(paginate(1, 10, 1).0, 1);
        assert_eq!(paginate(1, 10, 10).0, 1);
        assert_eq!(paginate(1, 10, 11).0, 2);
        assert_eq!(paginate(1, 3, 7).0, 3);
    }

    #[test]
    fn test_first_page_with_overflow_has_next_only() {
        let (_, has_next, has_prev) = paginate(1, 10, 25);
        assert!(has_next);
        assert!(!has_prev);
    }

    #[test]
    fn test_page_beyond_last_never_has_next() {
        for page in 3..10 {
            let (_, has_next, _) = paginate(page, 10, 25);
            assert!(!has_next, "page {page}");
        }
    }

    #[test]
    fn test_flags_consistent_for_every_page() {
        let total = 23u64;
        let page_size = 5u32;
        for page in 1..12u32 {
            let (total_pages, has_next, has_prev) = paginate(page, page_size, total);
            assert_eq!(has_next, page < total_pages);
            assert_eq!(has_prev, page > 1);
        }
    }

    #[test]
    fn test_allow_list_covers_spec_formats() {
        const EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "mp4", "avi", "mov", "wmv"];
        for ext in ["jpeg", "jpg", "png", "gif", "mp4", "avi", "mov", "wmv"] {
            assert!(EXTENSIONS.contains(&ext));
        }
        assert!(!EXTENSIONS.contains(&"exe"));
        assert!(!EXTENSIONS.contains(&"svg"));
    }
}
