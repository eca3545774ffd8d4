//! Arguments for the operations a front end can request

use secrecy::{ExposeSecret, SecretString};
use std::fmt::Debug;

use crate::{errors::ValidationError, uac::Username};

#[derive(Clone)]
pub struct LoginReqArgs {
    pub username: String,
    pub password: SecretString,
    /// Save the password in the credential store after a successful login
    pub remember: bool,
}

impl LoginReqArgs {
    pub fn new<S: Into<String>>(username: S, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            remember: false,
        }
    }

    pub fn username(mut self, username: String) -> Self {
        self.username = username;
        self
    }

    pub fn password(mut self, password: SecretString) -> Self {
        self.password = password;
        self
    }

    pub fn remember(mut self, remember: bool) -> Self {
        self.remember = remember;
        self
    }

    /// Local checks that must pass before anything is sent to the portal
    pub fn validate(&self) -> Result<Username, ValidationError> {
        let username = Username::try_from(self.username.trim())?;
        if self.password.expose_secret().is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        Ok(username)
    }
}

impl Debug for LoginReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginReqArgs")
            .field("username", &self.username)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .field("remember", &self.remember)
            .finish()
    }
}
