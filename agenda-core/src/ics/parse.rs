//! Read busy times out of calendar data using the icalendar crate's parser.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

use crate::event::CalendarEvent;
use crate::recurrence::{RuleStart, expand_occurrences};

/// Parse every VEVENT of an ICS resource into [`CalendarEvent`]s.
///
/// Times are normalised to UTC. Floating times and dates are read in
/// `default_tz`, as are `TZID`s chrono-tz does not know. A missing `DTEND`
/// means one day for all-day events and zero length otherwise.
///
/// A master with an `RRULE` yields one event per occurrence starting in
/// `[range_start, range_end]`, less its `EXDATE`s and the occurrences
/// replaced by a `RECURRENCE-ID` override in the same resource.
pub fn parse_busy_events(
    content: &str,
    default_tz: Tz,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Vec<CalendarEvent> {
    let unfolded = unfold(content);
    let Ok(calendar) = read_calendar(&unfolded) else {
        return Vec::new();
    };
    let vevents: Vec<&Component> = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .collect();

    let overridden: Vec<DateTime<Utc>> = vevents
        .iter()
        .filter_map(|v| v.find_prop("RECURRENCE-ID"))
        .filter_map(|p| DatePerhapsTime::try_from(p).ok())
        .filter_map(|t| to_utc(&t, default_tz))
        .collect();

    let mut events = Vec::new();
    for vevent in vevents {
        let Some((start, start_utc, end_utc)) = event_times(vevent, default_tz) else {
            continue;
        };

        let rrule = vevent
            .find_prop("RRULE")
            .filter(|_| vevent.find_prop("RECURRENCE-ID").is_none());
        let Some(rrule) = rrule else {
            events.push(labelled(vevent, start_utc, end_utc));
            continue;
        };

        let mut excluded: Vec<DateTime<Utc>> = vevent
            .properties
            .iter()
            .filter(|p| p.name == "EXDATE")
            .flat_map(|p| parse_exdates(p, default_tz))
            .collect();
        excluded.extend(overridden.iter().copied());

        let length = end_utc - start_utc;
        match expand_occurrences(
            &rule_start(&start, default_tz),
            rrule.val.as_ref(),
            &excluded,
            range_start,
            range_end,
        ) {
            Ok(starts) => {
                events.extend(starts.into_iter().map(|s| labelled(vevent, s, s + length)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not expand recurring event, using its first occurrence");
                events.push(labelled(vevent, start_utc, end_utc));
            }
        }
    }

    events
}

fn event_times(
    vevent: &Component,
    default_tz: Tz,
) -> Option<(DatePerhapsTime, DateTime<Utc>, DateTime<Utc>)> {
    let start = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?;
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok());

    let start_utc = to_utc(&start, default_tz)?;
    let end_utc = match (&end, &start) {
        (Some(end), _) => to_utc(end, default_tz)?,
        (None, DatePerhapsTime::Date(_)) => start_utc + Duration::days(1),
        (None, DatePerhapsTime::DateTime(_)) => start_utc,
    };

    Some((start, start_utc, end_utc))
}

fn labelled(vevent: &Component, start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarEvent {
    let mut event = CalendarEvent::from_utc(start, end);
    event.uid = vevent.find_prop("UID").map(|p| p.val.to_string());
    event.summary = vevent.find_prop("SUMMARY").map(|p| p.val.to_string());
    event
}

fn rule_start(start: &DatePerhapsTime, default_tz: Tz) -> RuleStart {
    match start {
        DatePerhapsTime::Date(date) => RuleStart::Zoned(date.and_time(chrono::NaiveTime::MIN), default_tz),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => RuleStart::Utc(*dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            RuleStart::Zoned(*naive, default_tz)
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            RuleStart::Zoned(*date_time, tzid.parse::<Tz>().unwrap_or(default_tz))
        }
    }
}

/// `EXDATE` values as instants. One property may hold several
/// comma-separated values, as dates, UTC, TZID-zoned or floating times.
fn parse_exdates(prop: &Property, default_tz: Tz) -> Vec<DateTime<Utc>> {
    let tz = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref())
        .and_then(|v| v.as_ref().parse::<Tz>().ok())
        .unwrap_or(default_tz);

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter_map(|value| {
            if let Some(utc) = value.strip_suffix('Z') {
                return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| dt.and_utc());
            }
            if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
                return date_start(date, tz);
            }
            NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
                .ok()
                .and_then(|naive| local_to_utc(&naive, tz))
        })
        .collect()
}

fn to_utc(time: &DatePerhapsTime, default_tz: Tz) -> Option<DateTime<Utc>> {
    match time {
        DatePerhapsTime::Date(date) => date_start(*date, default_tz),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(*dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            local_to_utc(naive, default_tz)
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let tz = tzid.parse::<Tz>().unwrap_or(default_tz);
            local_to_utc(date_time, tz)
        }
    }
}

fn date_start(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    local_to_utc(&date.and_hms_opt(0, 0, 0)?, tz)
}

fn local_to_utc(naive: &NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
