//! RRULE expansion for recurring busy blocks.
//!
//! A recurring event arrives from the calendar as its master VEVENT only.
//! Each occurrence inside the listing window has to become its own busy
//! interval, minus EXDATEs and occurrences moved by an override.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::{AgendaError, AgendaResult};

/// Upper bound on occurrences taken from one rule.
const MAX_OCCURRENCES: u16 = 500;

/// The master's DTSTART, in the form the rrule parser accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleStart {
    Utc(DateTime<Utc>),
    /// Local wall-clock time in a known zone (floating and all-day starts
    /// are read in the business timezone).
    Zoned(chrono::NaiveDateTime, Tz),
}

impl RuleStart {
    fn to_ics_line(&self) -> String {
        match self {
            RuleStart::Utc(dt) => format!("DTSTART:{}", dt.format("%Y%m%dT%H%M%SZ")),
            RuleStart::Zoned(naive, tz) => {
                format!("DTSTART;TZID={}:{}", tz.name(), naive.format("%Y%m%dT%H%M%S"))
            }
        }
    }
}

/// Start instants of every occurrence of `rrule` that begins in
/// `[range_start, range_end]`, skipping `excluded` instants.
pub fn expand_occurrences(
    start: &RuleStart,
    rrule: &str,
    excluded: &[DateTime<Utc>],
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> AgendaResult<Vec<DateTime<Utc>>> {
    let rule_text = format!("{}\nRRULE:{}", start.to_ics_line(), rrule);
    let rule_set: RRuleSet = rule_text
        .parse()
        .map_err(|e| AgendaError::Recurrence(format!("{rrule}: {e}")))?;

    // after/before are exclusive
    let tz: rrule::Tz = Utc.into();
    let after = (range_start - Duration::seconds(1)).with_timezone(&tz);
    let before = (range_end + Duration::seconds(1)).with_timezone(&tz);

    let result = rule_set.after(after).before(before).all(MAX_OCCURRENCES);

    Ok(result
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| !excluded.contains(dt))
        .collect())
}
