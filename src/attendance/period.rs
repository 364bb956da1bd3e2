use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::attendance::aggregator::local_midnight;

/// Reporting window granularity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
}

/// Half-open `[start, end)` window in a concrete time zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodWindow<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl ReportPeriod {
    /// First date of the period containing `anchor`. Weeks start on Sunday.
    pub fn start_date(self, anchor: NaiveDate) -> NaiveDate {
        let back = match self {
            ReportPeriod::Daily => 0,
            ReportPeriod::Weekly => anchor.weekday().num_days_from_sunday(),
            ReportPeriod::Monthly => anchor.day0(),
        };
        anchor - Days::new(u64::from(back))
    }

    /// First date after the period containing `anchor`.
    pub fn end_date(self, anchor: NaiveDate) -> NaiveDate {
        let start = self.start_date(anchor);
        let end = match self {
            ReportPeriod::Daily => start.checked_add_days(Days::new(1)),
            ReportPeriod::Weekly => start.checked_add_days(Days::new(7)),
            ReportPeriod::Monthly => start.checked_add_months(Months::new(1)),
        };
        end.unwrap_or(NaiveDate::MAX)
    }

    pub fn window<Tz: TimeZone>(self, anchor: NaiveDate, tz: &Tz) -> PeriodWindow<Tz> {
        PeriodWindow {
            start: local_midnight(tz, self.start_date(anchor)),
            end: local_midnight(tz, self.end_date(anchor)),
        }
    }

    /// Days a full-time employee is expected on site during the period.
    pub fn expected_working_days(self, anchor: NaiveDate, working_days_per_week: u32) -> u32 {
        match self {
            ReportPeriod::Daily => 1,
            ReportPeriod::Weekly => working_days_per_week,
            ReportPeriod::Monthly => {
                let end = self.end_date(anchor);
                self.start_date(anchor)
                    .iter_days()
                    .take_while(|d| *d < end)
                    .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
                    .count() as u32
            }
        }
    }

    /// Moves `anchor` one period back or forward.
    ///
    /// Monthly steps clamp to the last day of shorter months.
    pub fn shift(self, anchor: NaiveDate, direction: Direction) -> NaiveDate {
        let shifted = match (self, direction) {
            (ReportPeriod::Daily, Direction::Prev) => anchor.checked_sub_days(Days::new(1)),
            (ReportPeriod::Daily, Direction::Next) => anchor.checked_add_days(Days::new(1)),
            (ReportPeriod::Weekly, Direction::Prev) => anchor.checked_sub_days(Days::new(7)),
            (ReportPeriod::Weekly, Direction::Next) => anchor.checked_add_days(Days::new(7)),
            (ReportPeriod::Monthly, Direction::Prev) => anchor.checked_sub_months(Months::new(1)),
            (ReportPeriod::Monthly, Direction::Next) => anchor.checked_add_months(Months::new(1)),
        };
        shifted.unwrap_or(anchor)
    }

    /// Heading for the period, e.g. `"Oct 11 - Oct 17, 2026"` for a week.
    pub fn title(self, anchor: NaiveDate) -> String {
        match self {
            ReportPeriod::Daily => anchor.format("%A, %B %-d, %Y").to_string(),
            ReportPeriod::Weekly => {
                let start = self.start_date(anchor);
                let last = start + Days::new(6);
                format!("{} - {}", start.format("%b %-d"), last.format("%b %-d, %Y"))
            }
            ReportPeriod::Monthly => anchor.format("%B %Y").to_string(),
        }
    }
}
