//! iCalendar parsing (RFC 5545 §3.1).

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, split_lines};
pub use parser::parse;
pub use values::{
    parse_date, parse_datetime, parse_duration, parse_integer, parse_time, parse_utc_offset,
    unescape_text,
};
