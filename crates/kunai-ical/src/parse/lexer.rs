//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! Handles line unfolding and tokenization of content lines.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::model::{ContentLine, Parameter};

/// Splits input into content lines, merging folded continuations.
///
/// Handles both CRLF and bare LF line endings. Lines starting with SP/HTAB
/// are continuations of the previous line; per RFC 5545 §3.1, unfolding
/// removes the line break and the single whitespace character.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            let continuation = &line[1..];
            if let Some((_, prev)) = lines.last_mut() {
                prev.push_str(continuation);
            } else {
                lines.push((i + 1, continuation.to_string()));
            }
        } else if !line.contains(':') {
            // Lenient: treat lines without a colon as folded continuations.
            if let Some((_, prev)) = lines.last_mut() {
                prev.push_str(line);
            } else {
                lines.push((i + 1, line.to_string()));
            }
        } else {
            lines.push((i + 1, line.to_string()));
        }
    }

    lines
}

/// Parses a single content line.
///
/// Format: `name *(";" param) ":" value`
///
/// ## Errors
/// Returns an error if the line is malformed or contains invalid characters.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut chars = line.char_indices().peekable();
    let mut name_end = 0;
    let mut colon_pos = None;

    // Find the property name (ends at ';' or ':')
    while let Some(&(i, c)) = chars.peek() {
        if c == ';' || c == ':' {
            name_end = i;
            if c == ':' {
                colon_pos = Some(i);
            }
            break;
        }
        if !c.is_ascii_alphanumeric() && c != '-' {
            return Err(ParseError::new(
                ParseErrorKind::InvalidPropertyName,
                line_num,
                i + 1,
            ));
        }
        chars.next();
    }

    if name_end == 0 {
        return Err(ParseError::new(
            ParseErrorKind::MissingPropertyName,
            line_num,
            1,
        ));
    }

    let name = line[..name_end].to_ascii_uppercase();

    // Parse parameters if we stopped at ';'
    let mut params = Vec::new();
    if colon_pos.is_none() {
        chars.next(); // consume the ';'
        loop {
            let (param, colon) = parse_parameter(&mut chars, line, line_num)?;
            params.push(param);
            if let Some(i) = colon {
                colon_pos = Some(i);
                break;
            }
        }
    }

    let colon_pos = colon_pos
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingColon, line_num, line.len()))?;

    // Value is everything after the colon
    let value = &line[colon_pos + 1..];

    Ok(ContentLine {
        name,
        params,
        raw_value: value.to_string(),
    })
}

/// Parses a single parameter from the character stream.
///
/// Returns the parameter and, when the parameter list is finished, the
/// index of the terminating ':'.
fn parse_parameter(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line: &str,
    line_num: usize,
) -> ParseResult<(Parameter, Option<usize>)> {
    let start = chars.peek().map_or(line.len(), |&(i, _)| i);

    // Parse parameter name (up to '=')
    let mut name_end = start;
    while let Some(&(i, c)) = chars.peek() {
        if c == '=' {
            name_end = i;
            chars.next(); // consume '='
            break;
        }
        if !c.is_ascii_alphanumeric() && c != '-' {
            return Err(ParseError::new(
                ParseErrorKind::InvalidParameter,
                line_num,
                i + 1,
            ));
        }
        chars.next();
    }

    if name_end == start {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            start + 1,
        ));
    }

    let param_name = line[start..name_end].to_ascii_uppercase();

    // Parse parameter values (comma-separated, may be quoted)
    let mut values = Vec::new();
    loop {
        let value = parse_param_value(chars, line, line_num)?;
        values.push(value);

        match chars.peek() {
            Some(&(_, ',')) => {
                chars.next();
            }
            Some(&(_, ';')) => {
                chars.next();
                return Ok((Parameter::with_values(param_name, values), None));
            }
            Some(&(i, ':')) => {
                chars.next();
                return Ok((Parameter::with_values(param_name, values), Some(i)));
            }
            Some(&(i, c)) => {
                return Err(
                    ParseError::new(ParseErrorKind::InvalidParameter, line_num, i + 1)
                        .with_context(format!("unexpected character '{c}'")),
                );
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    }
}

/// Parses a parameter value (possibly quoted, with RFC 6868 caret decoding).
fn parse_param_value(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line: &str,
    line_num: usize,
) -> ParseResult<String> {
    let Some(&(start, first)) = chars.peek() else {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            line.len(),
        ));
    };

    if first == '"' {
        chars.next(); // consume opening quote
        let mut value = String::new();
        let mut closed = false;

        for (_i, c) in chars.by_ref() {
            if c == '"' {
                closed = true;
                break;
            }
            value.push(c);
        }

        if !closed {
            return Err(ParseError::new(
                ParseErrorKind::UnclosedQuote,
                line_num,
                start + 1,
            ));
        }

        Ok(decode_caret(&value))
    } else {
        // Unquoted value (ends at ',' ';' or ':')
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c == ',' || c == ';' || c == ':' {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        Ok(line[start..end].to_string())
    }
}

/// Decodes RFC 6868 caret escapes (`^^`, `^n`, `^'`) in a parameter value.
fn decode_caret(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '^' {
            match chars.peek() {
                Some('^') => {
                    result.push('^');
                    chars.next();
                }
                Some('n') => {
                    result.push('\n');
                    chars.next();
                }
                Some('\'') => {
                    result.push('"');
                    chars.next();
                }
                _ => result.push('^'),
            }
        } else {
            result.push(c);
        }
    }

    result
}
