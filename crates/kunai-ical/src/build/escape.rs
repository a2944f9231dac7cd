//! Text and parameter value escaping (RFC 5545 §3.3.11, RFC 6868).

/// Escapes a TEXT value for serialization.
///
/// Backslash, semicolon, and comma are backslash-escaped; newlines become
/// the literal `\n`. Carriage returns are dropped.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            ';' => result.push_str("\\;"),
            ',' => result.push_str("\\,"),
            '\n' => result.push_str("\\n"),
            '\r' => {}
            _ => result.push(c),
        }
    }
    result
}

/// Escapes a parameter value, quoting and caret-encoding as needed.
///
/// Values containing `:`, `;` or `,` are wrapped in DQUOTE per RFC 5545;
/// double quotes and newlines inside the value use RFC 6868 caret escapes.
#[must_use]
pub fn escape_param_value(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '^' => encoded.push_str("^^"),
            '\n' => encoded.push_str("^n"),
            '"' => encoded.push_str("^'"),
            '\r' => {}
            _ => encoded.push(c),
        }
    }

    if encoded.contains([':', ';', ',']) {
        format!("\"{encoded}\"")
    } else {
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_text_special_chars() {
        assert_eq!(escape_text("a;b,c\\d"), "a\\;b\\,c\\\\d");
        assert_eq!(escape_text("line1\nline2"), "line1\\nline2");
        assert_eq!(escape_text("plain"), "plain");
    }

    #[test]
    fn escape_param_quotes_when_needed() {
        assert_eq!(escape_param_value("America/New_York"), "America/New_York");
        assert_eq!(escape_param_value("Doe, Jane"), "\"Doe, Jane\"");
        assert_eq!(escape_param_value("a^b"), "a^^b");
        assert_eq!(escape_param_value("say \"hi\""), "say ^'hi^'");
    }
}
