//! List upcoming events from the booking calendar.
//!
//! Uses a time-range REPORT so only the days offered for booking are
//! transferred. Recurring events are expanded over the same window.

use agenda_core::CalendarEvent;
use agenda_core::ics::parse_busy_events;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::ICloudCalendar;
use crate::caldav::{EventsInRange, create_caldav_client};
use crate::discover::find_calendar;

pub async fn handle(calendar: &ICloudCalendar) -> Result<Option<Vec<CalendarEvent>>> {
    let Some(credentials) = calendar.credentials() else {
        tracing::warn!("No calendar credentials configured, skipping event listing");
        return Ok(None);
    };
    let config = calendar.config();

    let caldav = create_caldav_client(&config.caldav_url, credentials)?;

    let Some(found) = find_calendar(&caldav, &config.name).await? else {
        return Ok(None);
    };

    let (from, to) = lookahead_window(Utc::now(), config.timezone, calendar.days());

    let response = caldav
        .request(EventsInRange::new(&found.href, from, to))
        .await
        .context("Failed to fetch calendar resources")?;

    let events: Vec<CalendarEvent> = response
        .resources
        .iter()
        .flat_map(|resource| {
            let busy = parse_busy_events(&resource.data, config.timezone, from, to);
            if busy.is_empty() {
                tracing::debug!(href = %resource.href, "No busy time in resource");
            }
            busy
        })
        .collect();

    tracing::debug!(count = events.len(), calendar = %found.url, "Listed events");
    Ok(Some(events))
}

/// From local midnight of today in `tz` to local midnight after the last
/// of the `days` days offered for booking.
pub fn lookahead_window(now: DateTime<Utc>, tz: Tz, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(&tz).date_naive();
    let start = local_midnight(today, tz).unwrap_or(now);
    let end = local_midnight(today + Duration::days(days.max(1)), tz)
        .unwrap_or(now + Duration::days(days.max(1)));

    (start, end)
}

fn local_midnight(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_starts_at_local_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 15, 30, 0).unwrap();

        let (from, to) = lookahead_window(now, chrono_tz::America::Sao_Paulo, 7);

        assert_eq!(from, Utc.with_ymd_and_hms(2025, 3, 20, 3, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2025, 3, 27, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_window_covers_last_slot_of_last_carousel_day() {
        let tz = chrono_tz::America::Sao_Paulo;
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 18, 30, 0).unwrap();
        let today = now.with_timezone(&tz).date_naive();
        let last_day = agenda_core::slots::last_bookable_day(today, 8);

        let (from, to) = lookahead_window(now, tz, 8);

        // 19:00 in São Paulo on the 27th
        let last_slot = agenda_core::slots::Slot::new(19, 0)
            .unwrap()
            .start_on(last_day, tz)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(last_slot, Utc.with_ymd_and_hms(2025, 3, 27, 22, 0, 0).unwrap());
        assert!(from <= last_slot && last_slot + Duration::hours(1) <= to);
        assert_eq!(to, Utc.with_ymd_and_hms(2025, 3, 28, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_window_uses_local_date_late_in_the_evening() {
        // 01:00Z on the 21st is still the 20th in São Paulo.
        let now = Utc.with_ymd_and_hms(2025, 3, 21, 1, 0, 0).unwrap();

        let (from, _) = lookahead_window(now, chrono_tz::America::Sao_Paulo, 7);

        assert_eq!(from, Utc.with_ymd_and_hms(2025, 3, 20, 3, 0, 0).unwrap());
    }
}
