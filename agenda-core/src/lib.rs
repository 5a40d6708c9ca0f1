//! Core types for agenda.
//!
//! Shared by the CalDAV provider and the booking server:
//! - `slots`: the daily schedule and which slots are free on a date
//! - `booking`: form rules, the confirmation record and the WhatsApp link
//! - `event` / `ics`: calendar events and their ICS representation

pub mod booking;
pub mod config;
pub mod error;
pub mod event;
pub mod ics;
pub mod locale;
pub mod recurrence;
pub mod slots;

pub use config::Config;
pub use error::{AgendaError, AgendaResult};
pub use event::{BookingRequest, CalendarEvent, CreatedEvent, NewEvent};
