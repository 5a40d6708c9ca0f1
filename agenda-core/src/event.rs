//! Calendar event types exchanged between the UI, the API and the provider.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, AgendaResult};

/// An existing event on the calendar, as returned by `GET /api/get-events`.
///
/// `start` and `end` are ISO-8601 strings. The provider always emits UTC
/// with millisecond precision (`2025-03-20T12:00:00.000Z`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl CalendarEvent {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        CalendarEvent {
            start: start.into(),
            end: end.into(),
            uid: None,
            summary: None,
        }
    }

    pub fn from_utc(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(to_iso_string(start), to_iso_string(end))
    }
}

/// Body of `POST /api/create-event`.
///
/// Fields are passed through to the provider as-is; nothing here is
/// validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub start: String,
    pub end: String,
}

/// The resource a provider created for a [`BookingRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub uid: String,
    pub href: String,
}

/// An event ready to be written to the calendar, with its times expressed in
/// the business timezone so they are stored with a `TZID`.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl NewEvent {
    /// Interpret a [`BookingRequest`] in `tz`, with a fresh UID.
    pub fn from_request(request: &BookingRequest, tz: Tz) -> AgendaResult<Self> {
        Ok(NewEvent {
            uid: uuid::Uuid::new_v4().to_string(),
            summary: request.summary.clone(),
            description: request.description.clone(),
            start: parse_iso(&request.start)?.with_timezone(&tz),
            end: parse_iso(&request.end)?.with_timezone(&tz),
        })
    }
}

/// Format a UTC instant the way browsers' `Date.toISOString()` does.
pub fn to_iso_string(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_iso(s: &str) -> AgendaResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AgendaError::InvalidDateTime(format!("{s}: {e}")))
}
