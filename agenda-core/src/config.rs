//! Server configuration at ~/.config/agenda/config.toml
//!
//! Every field has a default, so a missing file (or a file that only sets a
//! few keys) is valid. Calendar credentials are never read from this file;
//! they come from the `username` / `password` environment variables.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, AgendaResult};

pub const DEFAULT_CALDAV_URL: &str = "https://caldav.icloud.com";
pub const DEFAULT_CALENDAR_NAME: &str = "Trabalho";
pub const DEFAULT_HOURS: [u32; 13] = [6, 7, 8, 9, 10, 11, 13, 14, 15, 16, 17, 18, 19];
pub const MAX_SLOT_MINUTES: i64 = 24 * 60;
pub const MAX_DAYS_SHOWN: i64 = 366;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub calendar: CalendarConfig,
    pub schedule: ScheduleConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS on the JSON API.
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 4000,
            allowed_origin: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub caldav_url: String,
    /// Display name of the calendar bookings are read from and written to.
    pub name: String,
    /// Timezone the schedule template and created events are expressed in.
    pub timezone: Tz,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            caldav_url: DEFAULT_CALDAV_URL.to_string(),
            name: DEFAULT_CALENDAR_NAME.to_string(),
            timezone: chrono_tz::America::Sao_Paulo,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Hours of the day a booking may start at.
    pub hours: Vec<u32>,
    /// Length of a booking, also the span a slot occupies when checked
    /// against busy intervals.
    pub slot_minutes: i64,
    /// Number of days in the date carousel, starting today. Only these days
    /// can be booked, and events are listed for exactly this span.
    pub days_shown: i64,
    /// Round every busy interval's end up to the next full hour.
    pub round_busy_end_up: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            hours: DEFAULT_HOURS.to_vec(),
            slot_minutes: 60,
            days_shown: 8,
            round_busy_end_up: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub services: Vec<String>,
    /// Number the confirmation page sends the customer to on WhatsApp,
    /// digits only with country code.
    pub whatsapp_number: String,
    pub redirect_delay_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        BookingConfig {
            services: vec!["Orçamento".to_string()],
            whatsapp_number: "5500000000000".to_string(),
            redirect_delay_secs: 5,
        }
    }
}

impl Config {
    pub fn config_path() -> AgendaResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgendaError::Config("Could not determine config directory".into()))?
            .join("agenda");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> AgendaResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> AgendaResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AgendaError::Config(format!("Could not read {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> AgendaResult<Self> {
        toml::from_str(contents).map_err(|e| AgendaError::Config(e.to_string()))
    }

    pub fn validate(&self) -> AgendaResult<()> {
        if let Some(hour) = self.schedule.hours.iter().find(|h| **h > 23) {
            return Err(AgendaError::Config(format!(
                "schedule.hours contains {hour}, expected 0-23"
            )));
        }
        if !(1..=MAX_SLOT_MINUTES).contains(&self.schedule.slot_minutes) {
            return Err(AgendaError::Config(format!(
                "schedule.slot_minutes must be between 1 and {MAX_SLOT_MINUTES}"
            )));
        }
        if !(1..=MAX_DAYS_SHOWN).contains(&self.schedule.days_shown) {
            return Err(AgendaError::Config(format!(
                "schedule.days_shown must be between 1 and {MAX_DAYS_SHOWN}"
            )));
        }
        if self.booking.services.is_empty() {
            return Err(AgendaError::Config(
                "booking.services needs at least one service".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.calendar.name, "Trabalho");
        assert_eq!(config.calendar.timezone, chrono_tz::America::Sao_Paulo);
        assert_eq!(config.schedule.hours, DEFAULT_HOURS.to_vec());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
[calendar]
name = "Consultas"
timezone = "Europe/Lisbon"

[booking]
whatsapp_number = "5511999999999"
"#,
        )
        .unwrap();

        assert_eq!(config.calendar.name, "Consultas");
        assert_eq!(config.calendar.timezone, chrono_tz::Europe::Lisbon);
        assert_eq!(config.calendar.caldav_url, DEFAULT_CALDAV_URL);
        assert_eq!(config.booking.whatsapp_number, "5511999999999");
        assert_eq!(config.booking.services, vec!["Orçamento".to_string()]);
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let result = Config::from_toml("[calendar]\ntimezone = \"Mars/Olympus\"\n");
        assert!(matches!(result, Err(AgendaError::Config(_))));
    }

    #[test]
    fn test_out_of_range_hour_fails_validation() {
        let config = Config::from_toml("[schedule]\nhours = [9, 24]\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_slot_length_is_bounded_to_a_day() {
        let huge = Config::from_toml("[schedule]\nslot_minutes = 9223372036854775807\n").unwrap();
        assert!(matches!(huge.validate(), Err(AgendaError::Config(_))));

        let zero = Config::from_toml("[schedule]\nslot_minutes = 0\n").unwrap();
        assert!(zero.validate().is_err());

        let day = Config::from_toml("[schedule]\nslot_minutes = 1440\n").unwrap();
        assert!(day.validate().is_ok());
    }

    #[test]
    fn test_days_shown_is_bounded() {
        let config = Config::from_toml("[schedule]\ndays_shown = 100000\n").unwrap();
        assert!(config.validate().is_err());
    }
}
