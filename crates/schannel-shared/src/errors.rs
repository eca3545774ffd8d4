use thiserror::Error;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Empty not allowed")]
    Empty,
    #[error("Maximum length exceeded. {max} allowed but found {actual}")]
    MaxExceeded { max: usize, actual: usize },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("The user has not logged in")]
pub struct NotLoggedInError;

/// Input that can be rejected without contacting the portal
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username is required")]
    EmptyUsername,
    #[error("Password is required")]
    EmptyPassword,
    #[error("Invalid username: {0}")]
    InvalidUsername(ConversionError),
}

impl From<ConversionError> for ValidationError {
    fn from(value: ConversionError) -> Self {
        match value {
            ConversionError::Empty => Self::EmptyUsername,
            other => Self::InvalidUsername(other),
        }
    }
}
