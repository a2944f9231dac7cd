//! Content line folding (RFC 5545 §3.1).

/// Maximum octets per line before folding, excluding the line break.
const MAX_LINE_OCTETS: usize = 75;

/// Folds a content line at 75 octets, never splitting inside a UTF-8
/// sequence. Continuation lines start with a single space, which counts
/// toward their budget.
#[must_use]
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut result = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut budget = MAX_LINE_OCTETS;
    let mut current = 0;

    for c in line.chars() {
        let width = c.len_utf8();
        if current + width > budget {
            result.push_str("\r\n ");
            current = 0;
            // Continuation lines lose one octet to the leading space.
            budget = MAX_LINE_OCTETS - 1;
        }
        result.push(c);
        current += width;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_line_unchanged() {
        assert_eq!(fold_line("SUMMARY:Short"), "SUMMARY:Short");
    }

    #[test]
    fn long_line_folds_at_75_octets() {
        let line = format!("DESCRIPTION:{}", "x".repeat(100));
        let folded = fold_line(&line);
        let parts: Vec<&str> = folded.split("\r\n").collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 75);
        assert!(parts[1].starts_with(' '));
        assert!(parts[1].len() <= 75);
    }

    #[test]
    fn fold_respects_utf8_boundaries() {
        let line = format!("SUMMARY:{}", "\u{e9}".repeat(60));
        let folded = fold_line(&line);
        for part in folded.split("\r\n") {
            assert!(part.len() <= 75);
            // Each fragment must itself be valid UTF-8 content.
            assert!(part.trim_start_matches(' ').chars().all(|c| c == '\u{e9}' || c.is_ascii()));
        }
    }

    #[test]
    fn unfolding_recovers_original() {
        let line = format!("DESCRIPTION:{}", "abcdefgh".repeat(20));
        let folded = fold_line(&line);
        let unfolded: String = folded.replace("\r\n ", "");
        assert_eq!(unfolded, line);
    }
}
