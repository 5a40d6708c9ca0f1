//! The calendar the server reads availability from and books into.

use agenda_core::{BookingRequest, CalendarEvent, CreatedEvent};
use agenda_provider_icloud::ICloudCalendar;
use anyhow::Result;
use async_trait::async_trait;

/// Calendar operations the HTTP layer needs.
///
/// `Ok(None)` means the calendar is not available (missing credentials or no
/// calendar with the configured name), which callers treat as "nothing to
/// show" rather than as a failure.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn list_events(&self) -> Result<Option<Vec<CalendarEvent>>>;

    async fn create_event(&self, request: &BookingRequest) -> Result<Option<CreatedEvent>>;
}

#[async_trait]
impl CalendarBackend for ICloudCalendar {
    async fn list_events(&self) -> Result<Option<Vec<CalendarEvent>>> {
        ICloudCalendar::list_events(self).await
    }

    async fn create_event(&self, request: &BookingRequest) -> Result<Option<CreatedEvent>> {
        ICloudCalendar::create_event(self, request).await
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory calendar for handler tests.

    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryCalendar {
        pub events: Mutex<Vec<CalendarEvent>>,
        pub created: Mutex<Vec<BookingRequest>>,
        pub missing: bool,
        pub failing: bool,
    }

    impl MemoryCalendar {
        pub fn with_events(events: Vec<CalendarEvent>) -> Self {
            MemoryCalendar {
                events: Mutex::new(events),
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            MemoryCalendar {
                failing: true,
                ..Default::default()
            }
        }

        pub fn missing() -> Self {
            MemoryCalendar {
                missing: true,
                ..Default::default()
            }
        }

        pub fn created(&self) -> Vec<BookingRequest> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CalendarBackend for MemoryCalendar {
        async fn list_events(&self) -> Result<Option<Vec<CalendarEvent>>> {
            if self.failing {
                anyhow::bail!("calendar unreachable");
            }
            if self.missing {
                return Ok(None);
            }
            Ok(Some(self.events.lock().unwrap().clone()))
        }

        async fn create_event(&self, request: &BookingRequest) -> Result<Option<CreatedEvent>> {
            if self.failing {
                anyhow::bail!("calendar unreachable");
            }
            if self.missing {
                return Ok(None);
            }

            let mut created = self.created.lock().unwrap();
            created.push(request.clone());
            self.events
                .lock()
                .unwrap()
                .push(CalendarEvent::new(request.start.clone(), request.end.clone()));

            let uid = format!("memory-{}", created.len());
            Ok(Some(CreatedEvent {
                href: format!("/calendars/trabalho/{uid}.ics"),
                uid,
            }))
        }
    }
}
