//! ICS generation and parsing.
//!
//! Only the pieces of RFC 5545 the booking flow touches: writing a single
//! timezone-aware VEVENT and reading busy intervals, recurring ones included, back out of calendar data.

mod generate;
mod parse;

pub use generate::generate_ics;
pub use parse::parse_busy_events;
