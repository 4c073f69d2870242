//! Text helpers shared by the document index and the matchers.

const ELLIPSIS: &str = "...";

/// Normalizes heading text for comparison: trims, collapses internal
/// whitespace to single spaces and case-folds.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-folds text for substring comparison without touching whitespace.
#[must_use]
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Truncates `text` to at most `max_chars` characters, appending `...`
/// when anything was cut and there is room for it. Always splits on a
/// char boundary.
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return text.chars().take(max_chars).collect();
    }
    let keep = max_chars - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize("  Quick   START\tGuide "), "quick start guide");
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let cut = truncate("ééééééééé", 6);
        assert_eq!(cut, "ééé...");
        assert_eq!(cut.chars().count(), 6);
    }

    #[test]
    fn truncate_never_exceeds_tiny_limits() {
        assert_eq!(truncate("Prerequisites", 3), "Pre");
        assert_eq!(truncate("Prerequisites", 1), "P");
        assert_eq!(truncate("Prerequisites", 0), "");
        assert_eq!(truncate("Prerequisites", 4), "P...");
    }
}
