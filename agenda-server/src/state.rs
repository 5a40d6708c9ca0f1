use std::sync::Arc;

use agenda_core::Config;
use agenda_core::slots::SlotPolicy;

use crate::backend::CalendarBackend;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub calendar: Arc<dyn CalendarBackend>,
}

impl AppState {
    pub fn new(config: Config, calendar: Arc<dyn CalendarBackend>) -> Self {
        AppState {
            config: Arc::new(config),
            calendar,
        }
    }

    pub fn slot_policy(&self) -> SlotPolicy {
        SlotPolicy::new(self.config.calendar.timezone, &self.config.schedule)
    }
}
