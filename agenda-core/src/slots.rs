//! Slot availability.
//!
//! The schedule is a fixed list of start hours per day. A slot is available
//! on a date when the span it would occupy does not overlap any busy
//! interval taken from the calendar. Intervals are half-open, so a slot that
//! starts exactly when an event ends is free.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_SLOT_MINUTES, ScheduleConfig};
use crate::error::{AgendaError, AgendaResult};
use crate::event::{CalendarEvent, parse_iso};

/// A candidate appointment start time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub label: String,
    pub hour: u32,
    pub minute: u32,
}

impl Slot {
    pub fn new(hour: u32, minute: u32) -> AgendaResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(AgendaError::InvalidSlot(format!("{hour}:{minute}")));
        }
        Ok(Slot {
            label: format!("{hour:02}:{minute:02}"),
            hour,
            minute,
        })
    }

    /// Parse a `HH:MM` label.
    pub fn parse(label: &str) -> AgendaResult<Self> {
        let invalid = || AgendaError::InvalidSlot(label.to_string());
        let (hour, minute) = label.trim().split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Slot::new(hour, minute)
    }

    /// The instant this slot starts on `date` in `tz`.
    ///
    /// Returns `None` for local times skipped by a DST transition.
    pub fn start_on(&self, date: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
        let naive = date.and_hms_opt(self.hour, self.minute, 0)?;
        tz.from_local_datetime(&naive).earliest()
    }
}

/// Build the day's candidate slots from the schedule's start hours.
pub fn default_slots(hours: &[u32]) -> Vec<Slot> {
    hours
        .iter()
        .filter_map(|hour| Slot::new(*hour, 0).ok())
        .collect()
}

/// A busy `[start, end)` range on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn from_event(event: &CalendarEvent) -> AgendaResult<Self> {
        Ok(BusyInterval {
            start: parse_iso(&event.start)?,
            end: parse_iso(&event.end)?,
        })
    }

    /// Round the end up to the next full hour (unchanged if already on one).
    pub fn rounded_up(self) -> Self {
        let end = self.end;
        if end.minute() == 0 && end.second() == 0 && end.nanosecond() == 0 {
            return self;
        }
        let floored = end
            .with_minute(0)
            .and_then(|dt| dt.with_second(0))
            .and_then(|dt| dt.with_nanosecond(0))
            .unwrap_or(end);
        BusyInterval {
            start: self.start,
            end: floored + Duration::hours(1),
        }
    }

    /// Whether `[start, start + length)` overlaps this interval.
    pub fn overlaps(&self, start: DateTime<Utc>, length: Duration) -> bool {
        start < self.end && self.start < start + length
    }
}

/// How slots are compared against busy intervals.
#[derive(Debug, Clone, Copy)]
pub struct SlotPolicy {
    pub timezone: Tz,
    pub slot_length: Duration,
    pub round_busy_end_up: bool,
}

impl SlotPolicy {
    pub fn new(timezone: Tz, schedule: &ScheduleConfig) -> Self {
        SlotPolicy {
            timezone,
            slot_length: Duration::minutes(schedule.slot_minutes.clamp(1, MAX_SLOT_MINUTES)),
            round_busy_end_up: schedule.round_busy_end_up,
        }
    }
}

/// Return the candidates that are free on `date`.
///
/// Events whose times cannot be parsed are ignored.
pub fn available_slots(
    candidates: &[Slot],
    events: &[CalendarEvent],
    date: NaiveDate,
    policy: &SlotPolicy,
) -> Vec<Slot> {
    let busy: Vec<BusyInterval> = events
        .iter()
        .filter_map(|event| match BusyInterval::from_event(event) {
            Ok(interval) if policy.round_busy_end_up => Some(interval.rounded_up()),
            Ok(interval) => Some(interval),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring event with unparseable times");
                None
            }
        })
        .collect();

    candidates
        .iter()
        .filter(|slot| {
            let Some(start) = slot.start_on(date, policy.timezone) else {
                return false;
            };
            let start = start.with_timezone(&Utc);
            !busy
                .iter()
                .any(|interval| interval.overlaps(start, policy.slot_length))
        })
        .cloned()
        .collect()
}

/// Display grouping of a day's slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
}

impl Period {
    pub fn of(slot: &Slot) -> Self {
        match slot.hour {
            0..12 => Period::Morning,
            12..18 => Period::Afternoon,
            _ => Period::Evening,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Period::Morning => "Manhã",
            Period::Afternoon => "Tarde",
            Period::Evening => "Noite",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodSlots {
    pub morning: Vec<Slot>,
    pub afternoon: Vec<Slot>,
    pub evening: Vec<Slot>,
}

impl PeriodSlots {
    pub fn groups(&self) -> [(Period, &[Slot]); 3] {
        [
            (Period::Morning, self.morning.as_slice()),
            (Period::Afternoon, self.afternoon.as_slice()),
            (Period::Evening, self.evening.as_slice()),
        ]
    }
}

pub fn partition_by_period(slots: &[Slot]) -> PeriodSlots {
    let mut grouped = PeriodSlots::default();
    for slot in slots {
        match Period::of(slot) {
            Period::Morning => grouped.morning.push(slot.clone()),
            Period::Afternoon => grouped.afternoon.push(slot.clone()),
            Period::Evening => grouped.evening.push(slot.clone()),
        }
    }
    grouped
}

/// Today's date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// The dates offered in the date carousel: `count` days starting at `from`.
pub fn carousel_days(from: NaiveDate, count: i64) -> Vec<NaiveDate> {
    (0..count).map(|i| from + Duration::days(i)).collect()
}

/// Last date that can be booked when `days_shown` days are offered.
pub fn last_bookable_day(today: NaiveDate, days_shown: i64) -> NaiveDate {
    today + Duration::days(days_shown.max(1) - 1)
}

/// Whether `date` is one of the carousel days.
pub fn is_bookable(date: NaiveDate, today: NaiveDate, days_shown: i64) -> bool {
    date >= today && date <= last_bookable_day(today, days_shown)
}

/// Drop slots that have already started at `now`.
pub fn not_started(slots: Vec<Slot>, date: NaiveDate, now: DateTime<Utc>, tz: Tz) -> Vec<Slot> {
    slots
        .into_iter()
        .filter(|slot| {
            slot.start_on(date, tz)
                .is_some_and(|start| start.with_timezone(&Utc) > now)
        })
        .collect()
}
