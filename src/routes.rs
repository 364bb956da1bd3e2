use crate::{
    api::{attendance, profile, reports},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{
    middleware::{Condition, from_fn},
    web,
};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Limiter {
    let burst = requests_per_min.max(1);
    let per_ms = 60_000 / burst as u64;
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("limiter period and burst are non-zero");
    Arc::new(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = build_limiter(config.rate_login_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);
    let punch_limiter = build_limiter(config.rate_punch_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/quick-pin")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::quick_pin_login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::resource("/auth/pin")
                    .route(web::post().to(handlers::setup_pin))
                    .route(web::delete().to(handlers::remove_pin)),
            )
            .service(
                web::resource("/profile")
                    .route(web::get().to(profile::get_profile))
                    .route(web::patch().to(profile::update_profile)),
            )
            .configure(|cfg| register_attendance(cfg, Some(punch_limiter))),
    );
}

/// Attendance and report routes without punch rate limiting.
pub fn attendance_routes(cfg: &mut web::ServiceConfig) {
    register_attendance(cfg, None);
}

fn register_attendance(cfg: &mut web::ServiceConfig, punch_limiter: Option<Limiter>) {
    let enabled = punch_limiter.is_some();
    let limiter = punch_limiter.unwrap_or_else(|| build_limiter(1));

    cfg.service(
        web::resource("/attendance/punch-in")
            .wrap(Condition::new(enabled, limiter.clone()))
            .route(web::post().to(attendance::punch_in)),
    )
    .service(
        web::resource("/attendance/punch-out")
            .wrap(Condition::new(enabled, limiter))
            .route(web::post().to(attendance::punch_out)),
    )
    .service(web::resource("/attendance/status").route(web::get().to(attendance::current_status)))
    .service(web::resource("/attendance/history").route(web::get().to(attendance::history)))
    .service(web::resource("/attendance/day").route(web::get().to(attendance::day_history)))
    // /reports/today must be matched before /reports/{period}
    .service(web::resource("/reports/today").route(web::get().to(reports::today)))
    .service(web::resource("/reports/{period}").route(web::get().to(reports::period_report)));
}

// LOGIN / QUICK PIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token
