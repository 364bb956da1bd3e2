use crate::{
    api::clock::{ClientClock, with_client_now},
    auth::auth::AuthUser,
    config::Config,
    model::{
        punch::{Location, PunchEvent, PunchKind},
        summary::AttendanceStatus,
    },
    services::attendance::{AttendanceService, DayHistory, Reported},
    store::PunchStore,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct PunchRequest {
    pub location: Location,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Inclusive lower bound (RFC 3339)
    #[param(value_type = Option<String>)]
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound (RFC 3339)
    #[param(value_type = Option<String>)]
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DayQuery {
    /// Local calendar day, defaults to today
    #[param(value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

fn service<'a>(store: &'a web::Data<dyn PunchStore>, config: &Config) -> AttendanceService<'a> {
    AttendanceService::new(store.get_ref(), config.working_days_per_week)
}

async fn record_punch(
    auth: AuthUser,
    store: web::Data<dyn PunchStore>,
    config: web::Data<Config>,
    request: PunchRequest,
    kind: PunchKind,
) -> actix_web::Result<HttpResponse> {
    let ctx = auth.context();

    let event = service(&store, &config)
        .punch(&ctx, kind, request.location, Utc::now())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = ctx.user_id, %kind, "Punch failed");
            actix_web::error::ErrorServiceUnavailable("Failed to record punch")
        })?;

    let message = match kind {
        PunchKind::CheckedIn => "Checked in successfully",
        PunchKind::CheckedOut => "Checked out successfully",
    };

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": message,
        "punch": event
    })))
}

/// Punch-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/punch-in",
    request_body = PunchRequest,
    responses(
        (status = 201, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Attendance store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn punch_in(
    auth: AuthUser,
    store: web::Data<dyn PunchStore>,
    config: web::Data<Config>,
    payload: web::Json<PunchRequest>,
) -> actix_web::Result<impl Responder> {
    record_punch(auth, store, config, payload.into_inner(), PunchKind::CheckedIn).await
}

/// Punch-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/punch-out",
    request_body = PunchRequest,
    responses(
        (status = 201, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Attendance store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn punch_out(
    auth: AuthUser,
    store: web::Data<dyn PunchStore>,
    config: web::Data<Config>,
    payload: web::Json<PunchRequest>,
) -> actix_web::Result<impl Responder> {
    record_punch(auth, store, config, payload.into_inner(), PunchKind::CheckedOut).await
}

/// Current status, today's hours and recent activity
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    params(ClientClock),
    responses(
        (status = 200, description = "Status snapshot; zero-valued with data_available=false when the store is down", body = AttendanceStatus),
        (status = 400, description = "Invalid utc_offset"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn current_status(
    auth: AuthUser,
    store: web::Data<dyn PunchStore>,
    config: web::Data<Config>,
    clock: web::Query<ClientClock>,
) -> actix_web::Result<impl Responder> {
    let service = service(&store, &config);
    let ctx = auth.context();

    let result = with_client_now!(clock, |now| service.current_status(&ctx, &now).await);

    Ok(HttpResponse::Ok().json(Reported::or_fallback(result, AttendanceStatus::default)))
}

/// Punch history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Punch records", body = [PunchEvent]),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Attendance store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    store: web::Data<dyn PunchStore>,
    config: web::Data<Config>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let ctx = auth.context();

    let events = service(&store, &config)
        .history(&ctx, query.from, query.to)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = ctx.user_id, "History fetch failed");
            actix_web::error::ErrorServiceUnavailable("Attendance data unavailable")
        })?;

    Ok(HttpResponse::Ok().json(events))
}

/// One day's punches with the hours they close
#[utoipa::path(
    get,
    path = "/api/attendance/day",
    params(DayQuery, ClientClock),
    responses(
        (status = 200, description = "Day history", body = Object, example = json!({
            "date": "2026-10-16",
            "records": [],
            "total_hours": "0h 0m",
            "data_available": true
        })),
        (status = 400, description = "Invalid utc_offset"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn day_history(
    auth: AuthUser,
    store: web::Data<dyn PunchStore>,
    config: web::Data<Config>,
    query: web::Query<DayQuery>,
    clock: web::Query<ClientClock>,
) -> actix_web::Result<impl Responder> {
    let service = service(&store, &config);
    let ctx = auth.context();

    let (date, result) = with_client_now!(clock, |now| {
        let date = query.date.unwrap_or_else(|| now.date_naive());
        (date, service.day_history(&ctx, date, &now.timezone()).await)
    });

    Ok(HttpResponse::Ok().json(Reported::or_fallback(result, || DayHistory {
        date,
        records: Vec::new(),
        total_hours: "0h 0m".to_string(),
    })))
}
