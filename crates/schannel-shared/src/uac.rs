//! Shared items related to logging in to the portal

mod errors;
mod user;

pub use errors::{AuthError, BusyError, LoginError};
pub use user::Username;
