//! iCloud calendar adapter for agenda.
//!
//! Talks CalDAV (through libdav) to a single calendar, looked up by display
//! name on every call. Nothing is cached and nothing is retried.

pub mod caldav;
mod commands;
pub mod credentials;
pub mod discover;

use agenda_core::config::CalendarConfig;
use agenda_core::{BookingRequest, CalendarEvent, CreatedEvent};
use anyhow::Result;

pub use commands::list_events::lookahead_window;
pub use credentials::Credentials;

/// The booking calendar on iCloud.
#[derive(Debug, Clone)]
pub struct ICloudCalendar {
    config: CalendarConfig,
    days: i64,
    credentials: Option<Credentials>,
}

impl ICloudCalendar {
    /// `days` is how many days, starting today, events are listed for.
    pub fn new(config: CalendarConfig, days: i64, credentials: Option<Credentials>) -> Self {
        ICloudCalendar {
            config,
            days,
            credentials,
        }
    }

    /// Use credentials from the `username` / `password` environment variables.
    pub fn from_env(config: CalendarConfig, days: i64) -> Self {
        Self::new(config, days, Credentials::from_env())
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Busy time from the start of today through the last bookable day,
    /// with recurring events expanded.
    ///
    /// `None` if credentials are missing or the calendar does not exist.
    pub async fn list_events(&self) -> Result<Option<Vec<CalendarEvent>>> {
        commands::list_events::handle(self).await
    }

    /// Create an event from a booking request.
    ///
    /// `None` if credentials are missing or the calendar does not exist.
    pub async fn create_event(&self, request: &BookingRequest) -> Result<Option<CreatedEvent>> {
        commands::create_event::handle(self, request).await
    }
}
