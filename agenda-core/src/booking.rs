//! Booking form rules and the confirmation record.
//!
//! A booking starts as a [`BookingForm`] filled in for a chosen date and
//! [`Slot`]. Once valid it becomes a [`Booking`], which yields the
//! [`BookingRequest`] sent to the calendar and the [`BookingRecord`] kept on
//! the customer's side for the confirmation page.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, AgendaResult};
use crate::event::{BookingRequest, parse_iso, to_iso_string};
use crate::locale::long_datetime;
use crate::slots::{Slot, SlotPolicy};

/// Name of the client-side record holding the last booking.
pub const RECORD_KEY: &str = "agendamento";

pub const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Contact details entered in the booking form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingForm {
    pub service: String,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Service,
    Name,
    Phone,
}

impl FormField {
    pub fn message(&self) -> &'static str {
        match self {
            FormField::Service => "Selecione um tipo de serviço.",
            FormField::Name => "Informe seu nome",
            FormField::Phone => "Informe seu telefone",
        }
    }
}

impl BookingForm {
    /// Check required fields. Only presence is checked, never format.
    ///
    /// The service must be one of `services`.
    pub fn validate(&self, services: &[String]) -> Result<(), Vec<FormField>> {
        let mut missing = Vec::new();

        let service = self.service.trim();
        if service.is_empty() || !services.iter().any(|s| s == service) {
            missing.push(FormField::Service);
        }
        if self.name.trim().is_empty() {
            missing.push(FormField::Name);
        }
        if self.phone.trim().is_empty() {
            missing.push(FormField::Phone);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

/// A validated booking for a concrete time.
#[derive(Debug, Clone)]
pub struct Booking {
    pub service: String,
    pub name: String,
    pub phone: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl Booking {
    pub fn new(
        form: &BookingForm,
        date: NaiveDate,
        slot: &Slot,
        policy: &SlotPolicy,
    ) -> AgendaResult<Self> {
        let start = slot.start_on(date, policy.timezone).ok_or_else(|| {
            AgendaError::InvalidSlot(format!("{} does not exist on {date}", slot.label))
        })?;

        Ok(Booking {
            service: form.service.trim().to_string(),
            name: form.name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            start,
            end: start + policy.slot_length,
        })
    }

    pub fn request(&self) -> BookingRequest {
        BookingRequest {
            summary: format!("{} {}", self.service, self.name),
            description: format!("Celular: {}. Agendado Online", self.phone),
            start: to_iso_string(self.start.to_utc()),
            end: to_iso_string(self.end.to_utc()),
        }
    }

    pub fn record(&self) -> BookingRecord {
        BookingRecord {
            start: to_iso_string(self.start.to_utc()),
            service: self.service.clone(),
            name: self.name.clone(),
        }
    }
}

/// The last booking made, read back by the confirmation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub start: String,
    pub service: String,
    pub name: String,
}

impl BookingRecord {
    pub fn to_json(&self) -> AgendaResult<String> {
        serde_json::to_string(self).map_err(|e| AgendaError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> AgendaResult<Self> {
        serde_json::from_str(json).map_err(|e| AgendaError::Serialization(e.to_string()))
    }

    /// JSON, percent-encoded so it fits in a cookie value.
    pub fn to_cookie_value(&self) -> AgendaResult<String> {
        Ok(url::form_urlencoded::byte_serialize(self.to_json()?.as_bytes()).collect())
    }

    /// Also accepts the plain JSON, for cookie jars that decode values.
    pub fn from_cookie_value(value: &str) -> AgendaResult<Self> {
        if value.starts_with('{') {
            return Self::from_json(value);
        }
        // byte_serialize escapes '&' and '=', so the value decodes as one key
        let json = url::form_urlencoded::parse(value.as_bytes())
            .next()
            .map(|(key, _)| key.into_owned())
            .unwrap_or_default();
        Self::from_json(&json)
    }

    pub fn start_in(&self, tz: Tz) -> AgendaResult<DateTime<Tz>> {
        Ok(parse_iso(&self.start)?.with_timezone(&tz))
    }

    /// `dd de <mês> às HH:mm` in `tz`.
    pub fn when(&self, tz: Tz) -> AgendaResult<String> {
        Ok(long_datetime(&self.start_in(tz)?))
    }

    pub fn whatsapp_message(&self, tz: Tz) -> AgendaResult<String> {
        Ok(format!(
            "Olá! Meu nome é {} e acabei de agendar {} para o dia {}.",
            self.name,
            self.service,
            self.when(tz)?
        ))
    }
}

/// `https://wa.me/<number>?text=<message>`, percent-encoded.
pub fn whatsapp_link(number: &str, message: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    // form encoding turns spaces into '+', literal '+' is already %2B
    let text: String = url::form_urlencoded::byte_serialize(message.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("{WHATSAPP_BASE_URL}/{digits}?text={text}")
}
