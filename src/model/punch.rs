use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PunchKind {
    CheckedIn,
    CheckedOut,
}

impl PunchKind {
    /// Human label shown in activity feeds
    pub fn label(self) -> &'static str {
        match self {
            PunchKind::CheckedIn => "Checked In",
            PunchKind::CheckedOut => "Checked Out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    #[schema(example = 25.0112)]
    pub latitude: f64,
    #[schema(example = 55.0617)]
    pub longitude: f64,
}

/// Reverse-geocoded address as reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    #[schema(example = "Jebel Ali Terminal 1", nullable = true)]
    pub name: Option<String>,
    #[schema(example = "Gate 5", nullable = true)]
    pub street: Option<String>,
    #[schema(example = "Dubai", nullable = true)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub coords: Coordinates,
    #[schema(nullable = true)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "9b2f6c1e-4d1a-4f0e-9a55-2b7d3f0c8e11",
        "kind": "checked-in",
        "timestamp": "2026-10-16T05:00:00Z",
        "location": {
            "coords": { "latitude": 25.0112, "longitude": 55.0617 },
            "address": { "name": "Jebel Ali Terminal 1", "street": null, "city": "Dubai" }
        },
        "user_id": 7
    })
)]
pub struct PunchEvent {
    pub id: String,
    pub kind: PunchKind,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
    pub location: Location,
    pub user_id: u64,
}

/// A punch that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewPunch {
    pub user_id: u64,
    pub kind: PunchKind,
    pub timestamp: DateTime<Utc>,
    pub location: Location,
}

/// Flat row of the `attendance_punches` table.
#[derive(Debug, sqlx::FromRow)]
pub struct PunchRow {
    pub id: String,
    pub user_id: u64,
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub address_name: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
}

impl TryFrom<PunchRow> for PunchEvent {
    type Error = strum::ParseError;

    fn try_from(row: PunchRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse::<PunchKind>()?;

        let address = if row.address_name.is_none()
            && row.address_street.is_none()
            && row.address_city.is_none()
        {
            None
        } else {
            Some(Address {
                name: row.address_name,
                street: row.address_street,
                city: row.address_city,
            })
        };

        Ok(PunchEvent {
            id: row.id,
            kind,
            timestamp: row.timestamp,
            location: Location {
                coords: Coordinates {
                    latitude: row.latitude,
                    longitude: row.longitude,
                },
                address,
            },
            user_id: row.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(kind: &str) -> PunchRow {
        PunchRow {
            id: "p-1".to_string(),
            user_id: 7,
            kind: kind.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
            latitude: 1.5,
            longitude: 2.5,
            address_name: None,
            address_street: None,
            address_city: Some("Dubai".to_string()),
        }
    }

    #[test]
    fn punch_kind_uses_kebab_case_on_the_wire() {
        assert_eq!(PunchKind::CheckedIn.to_string(), "checked-in");
        assert_eq!("checked-out".parse::<PunchKind>().unwrap(), PunchKind::CheckedOut);
        assert_eq!(
            serde_json::to_string(&PunchKind::CheckedOut).unwrap(),
            "\"checked-out\""
        );
    }

    #[test]
    fn row_converts_into_event() {
        let event = PunchEvent::try_from(row("checked-in")).unwrap();

        assert_eq!(event.kind, PunchKind::CheckedIn);
        assert_eq!(event.user_id, 7);
        assert_eq!(event.location.coords.latitude, 1.5);
        assert_eq!(
            event.location.address.and_then(|a| a.city).as_deref(),
            Some("Dubai")
        );
    }

    #[test]
    fn row_without_address_columns_has_no_address() {
        let mut r = row("checked-out");
        r.address_city = None;

        let event = PunchEvent::try_from(r).unwrap();
        assert!(event.location.address.is_none());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(PunchEvent::try_from(row("on-break")).is_err());
    }
}
