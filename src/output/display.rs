// display.rs - Presentation helpers for long alignment text

/// Cut `text` to at most `limit` characters, appending an explicit marker.
///
/// Returns the displayed text and whether anything was removed. Cuts always
/// land on a char boundary.
pub fn truncate_for_display(text: &str, limit: usize) -> (String, bool) {
    match text.char_indices().nth(limit) {
        None => (text.to_string(), false),
        Some((cut, _)) => {
            let hidden = text[cut..].chars().count();
            (
                format!("{}\n... [truncated {} more characters]", &text[..cut], hidden),
                true,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        let (shown, truncated) = truncate_for_display("ACGT", 10);
        assert_eq!(shown, "ACGT");
        assert!(!truncated);

        let (shown, truncated) = truncate_for_display("ACGT", 4);
        assert_eq!(shown, "ACGT");
        assert!(!truncated);
    }

    #[test]
    fn test_long_text_gets_marker() {
        let (shown, truncated) = truncate_for_display("ACGTACGTAC", 4);
        assert!(truncated);
        assert!(shown.starts_with("ACGT\n"));
        assert!(shown.ends_with("[truncated 6 more characters]"));
    }

    #[test]
    fn test_multibyte_boundary() {
        let (shown, truncated) = truncate_for_display("ααββ", 3);
        assert!(truncated);
        assert!(shown.starts_with("ααβ\n"));
    }
}
