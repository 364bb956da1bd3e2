use serde::Serialize;
use utoipa::ToSchema;

use crate::model::punch::PunchKind;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecentActivity {
    pub kind: PunchKind,
    #[schema(example = "Checked In")]
    pub title: String,
    #[schema(example = "09:00 AM")]
    pub time: String,
    #[schema(example = "Jebel Ali Terminal 1")]
    pub location: String,
}

/// Live snapshot of a user's attendance.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceStatus {
    pub status: PunchKind,
    #[schema(example = "01:00 PM", nullable = true)]
    pub last_punch: Option<String>,
    #[schema(example = "Jebel Ali Terminal 1", nullable = true)]
    pub location: Option<String>,
    #[schema(example = "3h 45m")]
    pub today_hours: String,
    pub recent_activity: Vec<RecentActivity>,
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        Self {
            status: PunchKind::CheckedOut,
            last_punch: None,
            location: None,
            today_hours: "0h 0m".to_string(),
            recent_activity: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(
    example = json!({
        "total_minutes": 1020.0,
        "total_hours": "17h 0m",
        "days_present": 2,
        "expected_working_days": 5,
        "attendance_rate": 40,
        "record_count": 4
    })
)]
pub struct AttendanceSummary {
    pub total_minutes: f64,
    pub total_hours: String,
    pub days_present: u32,
    pub expected_working_days: u32,
    /// Percentage in `0..=100`
    pub attendance_rate: u32,
    pub record_count: usize,
}

impl AttendanceSummary {
    pub fn zero(expected_working_days: u32) -> Self {
        Self {
            total_minutes: 0.0,
            total_hours: "0h 0m".to_string(),
            days_present: 0,
            expected_working_days,
            attendance_rate: 0,
            record_count: 0,
        }
    }

    /// `"2/5"` style presence ratio
    pub fn present_days(&self) -> String {
        format!("{}/{}", self.days_present, self.expected_working_days)
    }
}
