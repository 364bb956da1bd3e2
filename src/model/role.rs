use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee = 1,
    Supervisor = 2,
    Admin = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Employee),
            2 => Some(Role::Supervisor),
            3 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Supervisors and admins may read other users' attendance
    pub fn can_view_others(self) -> bool {
        matches!(self, Role::Supervisor | Role::Admin)
    }
}
