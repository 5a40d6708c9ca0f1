//! Brazilian Portuguese date formatting for the booking pages.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Weekday};

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

pub fn month_name(month: u32) -> &'static str {
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}

/// Upper-case weekday abbreviation, as shown on the date carousel.
pub fn weekday_abbrev(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "SEG",
        Weekday::Tue => "TER",
        Weekday::Wed => "QUA",
        Weekday::Thu => "QUI",
        Weekday::Fri => "SEX",
        Weekday::Sat => "SÁB",
        Weekday::Sun => "DOM",
    }
}

/// `dd/MM`
pub fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m").to_string()
}

/// `dd de <mês> às HH:mm`
pub fn long_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{:02} de {} às {}",
        dt.day(),
        month_name(dt.month()),
        dt.format("%H:%M")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_datetime_uses_portuguese_month() {
        let tz = chrono_tz::America::Sao_Paulo;
        let dt = tz.with_ymd_and_hms(2025, 3, 5, 9, 0, 0).unwrap();
        assert_eq!(long_datetime(&dt), "05 de março às 09:00");
    }

    #[test]
    fn test_carousel_labels() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        assert_eq!(weekday_abbrev(date), "QUI");
        assert_eq!(short_date(date), "20/03");
    }
}
