use crate::api::attendance::PunchRequest;
use crate::api::profile::UpdateProfile;
use crate::api::reports::TodayStats;
use crate::attendance::period::{Direction, ReportPeriod};
use crate::auth::handlers::LoginResponse;
use crate::model::punch::{Address, Coordinates, Location, PunchEvent, PunchKind};
use crate::model::summary::{AttendanceStatus, RecentActivity};
use crate::model::user::UserProfile;
use crate::models::{LoginReqDto, QuickPinLoginReq, SetupPinReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Punchclock API",
        version = "1.0.0",
        description = r#"
## Time & Attendance

Mobile clients record **check-in** and **check-out** punches with a location.
The server aggregates them into worked hours, a current status and period summaries.

### 🔹 Key Features
- **Punching**
  - Check in and check out with coordinates and a resolved address
- **Status**
  - Current status, today's hours and the most recent activity
- **Reports**
  - Daily, weekly and monthly totals, days present and attendance rate
- **Quick PIN**
  - Optional numeric PIN login for shared devices

### 🔐 Security
All attendance endpoints are protected using **JWT Bearer authentication**.
Supervisors and admins may read reports of other users in their own company.

### 📦 Response Format
- Status, day and report endpoints answer `200` even when attendance data is unavailable;
  `data_available: false` marks the zero-valued fallback
- Punch and history endpoints answer `503` when attendance data is unavailable
- `utc_offset` (minutes east of UTC) selects the device's day; the server zone is the default
- Hours are formatted as `"{h}h {m}m"`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::quick_pin_login,
        crate::auth::handlers::setup_pin,
        crate::auth::handlers::remove_pin,

        crate::api::attendance::punch_in,
        crate::api::attendance::punch_out,
        crate::api::attendance::current_status,
        crate::api::attendance::history,
        crate::api::attendance::day_history,

        crate::api::reports::today,
        crate::api::reports::period_report,

        crate::api::profile::get_profile,
        crate::api::profile::update_profile
    ),
    components(
        schemas(
            LoginReqDto,
            QuickPinLoginReq,
            SetupPinReq,
            LoginResponse,
            PunchRequest,
            PunchKind,
            PunchEvent,
            Coordinates,
            Address,
            Location,
            AttendanceStatus,
            RecentActivity,
            ReportPeriod,
            Direction,
            TodayStats,
            UserProfile,
            UpdateProfile
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and quick PIN APIs"),
        (name = "Attendance", description = "Punch recording and status APIs"),
        (name = "Reports", description = "Worked hours and attendance summaries"),
        (name = "Profile", description = "Current user's profile"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
