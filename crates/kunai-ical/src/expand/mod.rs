//! Timezone resolution and conversion to concrete instants.

mod timezone;
mod vtimezone;

pub use timezone::{ConversionError, TimeZoneResolver, convert_to_utc, convert_to_utc_lenient};
pub use vtimezone::synthesize_vtimezone;
