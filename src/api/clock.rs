use actix_web::error::ErrorBadRequest;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

/// The device's clock, for endpoints that depend on "today".
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ClientClock {
    /// Device offset from UTC in minutes (e.g. `240` for UTC+4).
    /// Defaults to the server's local zone.
    pub utc_offset: Option<i32>,
}

impl ClientClock {
    /// Fixed offset requested by the device, if any.
    pub fn offset(&self) -> actix_web::Result<Option<FixedOffset>> {
        self.utc_offset
            .map(|minutes| {
                minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .ok_or_else(|| ErrorBadRequest("utc_offset must lie within ±24h"))
            })
            .transpose()
    }
}

/// Calls `$body` with `$now` bound to the device's current time, or the
/// server's when no offset was given. Each arm monomorphizes the body for its
/// own time zone.
macro_rules! with_client_now {
    ($clock:expr, |$now:ident| $body:expr) => {
        match $clock.offset()? {
            Some(offset) => {
                let $now = $crate::api::clock::now_at(offset);
                $body
            }
            None => {
                let $now = chrono::Local::now();
                $body
            }
        }
    };
}

pub(crate) use with_client_now;

pub fn now_at(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}
