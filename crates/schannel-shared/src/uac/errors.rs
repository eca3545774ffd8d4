use crate::errors::ValidationError;

/// Why the portal refused (or was unable) to authenticate us
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Portal unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("Session expired, please login again")]
    SessionExpired,
}

impl AuthError {
    /// Returns `true` if trying again later may succeed without the user
    /// changing anything
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::RemoteUnavailable(_))
    }

    /// Returns `true` if the auth error is [`InvalidCredentials`].
    ///
    /// [`InvalidCredentials`]: AuthError::InvalidCredentials
    #[must_use]
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }
}

/// Another login is already in flight on the same session manager
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("A login attempt is already in progress")]
pub struct BusyError;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Login failed: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Busy(#[from] BusyError),
}

impl LoginError {
    /// Returns `true` if the login error is [`Busy`].
    ///
    /// A busy rejection should be treated like an ignored click rather than
    /// shown as a failure
    ///
    /// [`Busy`]: LoginError::Busy
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(..))
    }

    pub fn as_auth_error(&self) -> Option<&AuthError> {
        if let Self::Auth(v) = self {
            Some(v)
        } else {
            None
        }
    }
}
