use chrono::{DateTime, TimeZone, Utc};

use crate::model::punch::Address;

const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Renders a punch time as a local `hh:mm AM/PM` clock reading.
pub fn format_time_of_day<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp.with_timezone(tz).format("%I:%M %p").to_string()
}

/// Place name when the geocoder produced one, otherwise `"street, city"`.
pub fn format_location(address: Option<&Address>) -> String {
    let Some(address) = address else {
        return UNKNOWN_LOCATION.to_string();
    };

    match address.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!(
            "{}, {}",
            address.street.as_deref().unwrap_or(""),
            address.city.as_deref().unwrap_or("")
        )
        .trim()
        .to_string(),
    }
}
