use crate::{
    api::clock::{ClientClock, with_client_now},
    attendance::period::{Direction, ReportPeriod},
    auth::auth::AuthUser,
    config::Config,
    services::attendance::{AccessError, AttendanceService, PeriodReport, Reported},
    store::PunchStore,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Any local date inside the period, defaults to today
    #[param(value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    /// Step one period back or forward from `date`
    pub step: Option<Direction>,
    /// Report on another user of the same company (Supervisor/Admin only)
    pub user_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct TodayStats {
    #[schema(example = "3h 45m")]
    pub total_hours: String,
}

/// Hours worked today, including a running check-in
#[utoipa::path(
    get,
    path = "/api/reports/today",
    params(ClientClock),
    responses(
        (status = 200, description = "Today's hours", body = Object, example = json!({
            "total_hours": "3h 45m",
            "data_available": true
        })),
        (status = 400, description = "Invalid utc_offset"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn today(
    auth: AuthUser,
    store: web::Data<dyn PunchStore>,
    config: web::Data<Config>,
    clock: web::Query<ClientClock>,
) -> actix_web::Result<impl Responder> {
    let service = AttendanceService::new(store.get_ref(), config.working_days_per_week);
    let ctx = auth.context();

    let result = with_client_now!(clock, |now| service.today_hours(&ctx, &now).await)
        .map(|total_hours| TodayStats { total_hours });

    Ok(HttpResponse::Ok().json(Reported::or_fallback(result, || TodayStats {
        total_hours: "0h 0m".to_string(),
    })))
}

/// Daily, weekly or monthly attendance summary
#[utoipa::path(
    get,
    path = "/api/reports/{period}",
    params(
        ("period" = ReportPeriod, Path, description = "daily, weekly or monthly"),
        ReportQuery,
        ClientClock
    ),
    responses(
        (status = 200, description = "Period summary", body = Object, example = json!({
            "period": "weekly",
            "title": "Oct 11 - Oct 17, 2026",
            "start": "2026-10-11",
            "end": "2026-10-18",
            "present_days": "2/5",
            "total_minutes": 1020.0,
            "total_hours": "17h 0m",
            "days_present": 2,
            "expected_working_days": 5,
            "attendance_rate": 40,
            "record_count": 4,
            "data_available": true
        })),
        (status = 400, description = "Unknown period or invalid utc_offset"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Target user could not be checked")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn period_report(
    auth: AuthUser,
    store: web::Data<dyn PunchStore>,
    config: web::Data<Config>,
    path: web::Path<String>,
    query: web::Query<ReportQuery>,
    clock: web::Query<ClientClock>,
) -> actix_web::Result<impl Responder> {
    let period: ReportPeriod = path.parse().map_err(|_| {
        actix_web::error::ErrorBadRequest("period must be one of daily, weekly, monthly")
    })?;
    let ctx = auth.context_for(query.user_id)?;

    let service = AttendanceService::new(store.get_ref(), config.working_days_per_week);

    if ctx.user_id != auth.user_id {
        service.ensure_same_company(&ctx).await.map_err(|e| match e {
            AccessError::OtherCompany(_) => {
                actix_web::error::ErrorForbidden("User belongs to another company")
            }
            AccessError::Unavailable(e) => {
                tracing::error!(error = %e, user_id = ctx.user_id, "Company lookup failed");
                actix_web::error::ErrorServiceUnavailable("Attendance data unavailable")
            }
        })?;
    }

    let (anchor, result) = with_client_now!(clock, |now| {
        let mut anchor = query.date.unwrap_or_else(|| now.date_naive());
        if let Some(step) = query.step {
            anchor = period.shift(anchor, step);
        }
        (anchor, service.period_summary(&ctx, period, anchor, &now).await)
    });

    Ok(HttpResponse::Ok().json(Reported::or_fallback(result, || {
        PeriodReport::zero(period, anchor, service.working_days_per_week())
    })))
}
