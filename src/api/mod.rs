pub mod attendance;
pub mod clock;
pub mod profile;
pub mod reports;
