//! ICS generation for new bookings.

use chrono::DateTime;
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};

use crate::event::NewEvent;

/// Generate .ics content for a new event, with `DTSTART`/`DTEND` carrying
/// the event's `TZID`.
pub fn generate_ics(event: &NewEvent) -> String {
    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.uid);
    ics_event.summary(&event.summary);

    let dtstamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    ics_event.add_property("DTSTAMP", &dtstamp);

    add_zoned_property(&mut ics_event, "DTSTART", &event.start);
    add_zoned_property(&mut ics_event, "DTEND", &event.end);

    if !event.description.is_empty() {
        ics_event.description(&event.description);
    }

    let ics_event = ics_event.done();
    cal.push(ics_event);
    let cal = cal.done();

    finish_output(&cal.to_string())
}

const PRODID: &str = "-//agenda//booking//PT";

/// Put our PRODID in and drop the implied `CALSCALE:GREGORIAN`.
fn finish_output(ics: &str) -> String {
    ics.lines()
        .filter(|line| *line != "CALSCALE:GREGORIAN")
        .map(|line| {
            if line.starts_with("PRODID:") {
                format!("PRODID:{PRODID}\r\n")
            } else {
                format!("{line}\r\n")
            }
        })
        .collect()
}

fn add_zoned_property(ics_event: &mut icalendar::Event, name: &str, time: &DateTime<Tz>) {
    let mut prop = Property::new(name, time.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", time.timezone().name());
    ics_event.append_property(prop);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_test_event() -> NewEvent {
        let tz = chrono_tz::America::Sao_Paulo;
        NewEvent {
            uid: "4b1c7a0e-booking@agenda".to_string(),
            summary: "Orçamento Ana".to_string(),
            description: "Celular: 11999999999. Agendado Online".to_string(),
            start: tz.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap(),
            end: tz.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_generate_ics_uses_tzid() {
        let ics = generate_ics(&make_test_event());

        assert!(
            ics.contains("DTSTART;TZID=America/Sao_Paulo:20250320T090000"),
            "DTSTART should carry TZID. ICS:\n{}",
            ics
        );
        assert!(
            ics.contains("DTEND;TZID=America/Sao_Paulo:20250320T100000"),
            "DTEND should carry TZID. ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_generate_ics_has_uid_summary_and_description() {
        let ics = generate_ics(&make_test_event());

        assert!(ics.contains("UID:4b1c7a0e-booking@agenda"));
        assert!(ics.contains("SUMMARY:Orçamento Ana"));
        assert!(ics.contains("DESCRIPTION:Celular: 11999999999. Agendado Online"));
        assert!(ics.contains("PRODID:-//agenda//booking//PT"));
        assert!(!ics.contains("CALSCALE"));
    }

    #[test]
    fn test_generate_ics_skips_empty_description() {
        let mut event = make_test_event();
        event.description = String::new();

        let ics = generate_ics(&event);
        assert!(!ics.contains("DESCRIPTION"));
    }
}
