use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::attendance::aggregator::{
    RECENT_ACTIVITY_LIMIT, compute_period_summary, compute_worked_minutes, day_bounds,
    derive_current_status, format_duration,
};
use crate::attendance::period::ReportPeriod;
use crate::model::punch::{Location, NewPunch, PunchEvent, PunchKind};
use crate::model::summary::{AttendanceStatus, AttendanceSummary};
use crate::model::user::UserContext;
use crate::store::{PunchStore, StoreError};

/// Punch records could not be read or written.
#[derive(Debug, Error)]
#[error("attendance data unavailable: {0}")]
pub struct DataUnavailable(#[from] pub StoreError);

/// Why a caller may not read another user's records.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("user {0} belongs to another company")]
    OtherCompany(u64),

    #[error(transparent)]
    Unavailable(#[from] DataUnavailable),
}

/// A value together with whether it came from real data or from the
/// zero-valued fallback.
#[derive(Debug, Serialize)]
pub struct Reported<T> {
    #[serde(flatten)]
    pub data: T,
    pub data_available: bool,
}

impl<T> Reported<T> {
    /// Substitutes `fallback()` when the data could not be fetched.
    pub fn or_fallback(result: Result<T, DataUnavailable>, fallback: impl FnOnce() -> T) -> Self {
        match result {
            Ok(data) => Reported {
                data,
                data_available: true,
            },
            Err(e) => {
                warn!(error = %e, "Serving zero-valued fallback");
                Reported {
                    data: fallback(),
                    data_available: false,
                }
            }
        }
    }
}

/// Punches of one local day and the hours they close.
#[derive(Debug, Serialize)]
pub struct DayHistory {
    pub date: NaiveDate,
    pub records: Vec<PunchEvent>,
    pub total_hours: String,
}

/// Summary of one report period.
#[derive(Debug, Serialize)]
pub struct PeriodReport {
    pub period: ReportPeriod,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub present_days: String,
    #[serde(flatten)]
    pub summary: AttendanceSummary,
}

impl PeriodReport {
    pub fn zero(period: ReportPeriod, anchor: NaiveDate, working_days_per_week: u32) -> Self {
        let summary =
            AttendanceSummary::zero(period.expected_working_days(anchor, working_days_per_week));
        PeriodReport {
            period,
            title: period.title(anchor),
            start: period.start_date(anchor),
            end: period.end_date(anchor),
            present_days: summary.present_days(),
            summary,
        }
    }
}

/// Reads punch records for a [`UserContext`] and aggregates them.
pub struct AttendanceService<'a> {
    store: &'a dyn PunchStore,
    working_days_per_week: u32,
}

impl<'a> AttendanceService<'a> {
    pub fn new(store: &'a dyn PunchStore, working_days_per_week: u32) -> Self {
        Self {
            store,
            working_days_per_week,
        }
    }

    pub async fn punch(
        &self,
        ctx: &UserContext,
        kind: PunchKind,
        location: Location,
        now: DateTime<Utc>,
    ) -> Result<PunchEvent, DataUnavailable> {
        let event = self
            .store
            .append_event(NewPunch {
                user_id: ctx.user_id,
                kind,
                timestamp: now,
                location,
            })
            .await?;

        debug!(user = %ctx, punch_id = %event.id, %kind, "Punch recorded");
        Ok(event)
    }

    pub async fn current_status<Tz: TimeZone>(
        &self,
        ctx: &UserContext,
        now: &DateTime<Tz>,
    ) -> Result<AttendanceStatus, DataUnavailable>
    where
        Tz::Offset: std::fmt::Display,
    {
        let (start, end) = day_bounds(now);
        let mut events = self
            .store
            .fetch_events(ctx.user_id, Some(start), Some(end))
            .await?;

        // The newest punches may predate today
        let latest = self
            .store
            .fetch_latest(ctx.user_id, RECENT_ACTIVITY_LIMIT)
            .await?;
        for event in latest {
            if !events.iter().any(|e| e.id == event.id) {
                events.push(event);
            }
        }

        Ok(derive_current_status(&events, now))
    }

    /// Fails unless `target` is a member of the company its context carries.
    pub async fn ensure_same_company(&self, target: &UserContext) -> Result<(), AccessError> {
        let company = self
            .store
            .company_of(target.user_id)
            .await
            .map_err(DataUnavailable::from)?;

        if company.as_deref() == Some(target.company_code.as_str()) {
            Ok(())
        } else {
            warn!(user_id = target.user_id, company = %target.company_code, "Cross-company read denied");
            Err(AccessError::OtherCompany(target.user_id))
        }
    }

    /// Today's hours, counting an open check-in up to `now`.
    pub async fn today_hours<Tz: TimeZone>(
        &self,
        ctx: &UserContext,
        now: &DateTime<Tz>,
    ) -> Result<String, DataUnavailable> {
        let (start, end) = day_bounds(now);
        let events = self
            .store
            .fetch_events(ctx.user_id, Some(start), Some(end))
            .await?;

        let minutes = compute_worked_minutes(&events, Some(now.with_timezone(&Utc)));
        Ok(format_duration(minutes))
    }

    pub async fn period_summary<Tz: TimeZone>(
        &self,
        ctx: &UserContext,
        period: ReportPeriod,
        anchor: NaiveDate,
        now: &DateTime<Tz>,
    ) -> Result<PeriodReport, DataUnavailable> {
        let window = period.window(anchor, &now.timezone());
        let events = self
            .store
            .fetch_events(
                ctx.user_id,
                Some(window.start.with_timezone(&Utc)),
                Some(window.end.with_timezone(&Utc)),
            )
            .await?;

        let expected = period.expected_working_days(anchor, self.working_days_per_week);
        let summary = compute_period_summary(&events, &window.start, &window.end, expected, now);

        debug!(
            user = %ctx,
            %period,
            %anchor,
            records = summary.record_count,
            "Period summary computed"
        );

        Ok(PeriodReport {
            period,
            title: period.title(anchor),
            start: period.start_date(anchor),
            end: period.end_date(anchor),
            present_days: summary.present_days(),
            summary,
        })
    }

    /// Punches in `[from, to)`, newest first.
    pub async fn history(
        &self,
        ctx: &UserContext,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<PunchEvent>, DataUnavailable> {
        let mut events = self.store.fetch_events(ctx.user_id, from, to).await?;
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(events)
    }

    /// One local day of punches, oldest first. Only closed intervals count
    /// towards the total.
    pub async fn day_history<Tz: TimeZone>(
        &self,
        ctx: &UserContext,
        date: NaiveDate,
        tz: &Tz,
    ) -> Result<DayHistory, DataUnavailable> {
        let window = ReportPeriod::Daily.window(date, tz);
        let mut records = self
            .store
            .fetch_events(
                ctx.user_id,
                Some(window.start.with_timezone(&Utc)),
                Some(window.end.with_timezone(&Utc)),
            )
            .await?;
        records.sort_by_key(|e| e.timestamp);

        let total_hours = format_duration(compute_worked_minutes(&records, None));
        Ok(DayHistory {
            date,
            records,
            total_hours,
        })
    }

    pub fn working_days_per_week(&self) -> u32 {
        self.working_days_per_week
    }
}
