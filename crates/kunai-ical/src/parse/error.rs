//! iCalendar parse error types.

use std::fmt;

/// Result type for iCalendar parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// An error that occurred during iCalendar parsing, with source position.
#[derive(Debug)]
pub struct ParseError {
    /// Error kind.
    pub kind: ParseErrorKind,
    /// 1-based source line.
    pub line: usize,
    /// 1-based source column.
    pub col: usize,
    /// Optional free-form context.
    pub context: Option<String>,
}

impl ParseError {
    /// Creates a new parse error at the given position.
    #[must_use]
    pub const fn new(kind: ParseErrorKind, line: usize, col: usize) -> Self {
        Self {
            kind,
            line,
            col,
            context: None,
        }
    }

    /// Attaches free-form context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}: {}", self.line, self.col, self.kind)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Parse error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input did not start with a BEGIN line.
    MissingBegin,
    /// A component was not closed with END.
    MissingEnd,
    /// BEGIN/END names did not match.
    MismatchedComponent,
    /// Content line had no property name.
    MissingPropertyName,
    /// Property name contained invalid characters.
    InvalidPropertyName,
    /// Content line had no `:` separator.
    MissingColon,
    /// Malformed property parameter.
    InvalidParameter,
    /// Quoted parameter value was never closed.
    UnclosedQuote,
    /// Malformed DATE value.
    InvalidDate,
    /// Malformed TIME value.
    InvalidTime,
    /// Malformed DATE-TIME value.
    InvalidDateTime,
    /// Malformed DURATION value.
    InvalidDuration,
    /// Malformed UTC-OFFSET value.
    InvalidUtcOffset,
    /// Malformed INTEGER value.
    InvalidInteger,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBegin => write!(f, "missing BEGIN"),
            Self::MissingEnd => write!(f, "missing END"),
            Self::MismatchedComponent => write!(f, "mismatched component"),
            Self::MissingPropertyName => write!(f, "missing property name"),
            Self::InvalidPropertyName => write!(f, "invalid property name"),
            Self::MissingColon => write!(f, "missing ':' separator"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::UnclosedQuote => write!(f, "unclosed quote"),
            Self::InvalidDate => write!(f, "invalid DATE value"),
            Self::InvalidTime => write!(f, "invalid TIME value"),
            Self::InvalidDateTime => write!(f, "invalid DATE-TIME value"),
            Self::InvalidDuration => write!(f, "invalid DURATION value"),
            Self::InvalidUtcOffset => write!(f, "invalid UTC-OFFSET value"),
            Self::InvalidInteger => write!(f, "invalid INTEGER value"),
        }
    }
}
