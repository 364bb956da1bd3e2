pub mod punch;
pub mod role;
pub mod summary;
pub mod user;
