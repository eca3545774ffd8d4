use std::fmt::Debug;

use schannel_time::{Seconds, Timestamp};
use secrecy::{ExposeSecret as _, SecretString};

use crate::uac::Username;

/// Proof of authentication handed out by the portal.
///
/// Only ever held in memory, a restart always requires a new login.
#[derive(Clone)]
pub struct Session {
    username: Username,
    cookies: Vec<SessionCookie>,
    created_at: Timestamp,
}

#[derive(Clone)]
pub struct SessionCookie {
    pub name: String,
    pub value: SecretString,
}

impl Session {
    pub fn new(username: Username, cookies: Vec<SessionCookie>) -> Self {
        Self {
            username,
            cookies,
            created_at: Timestamp::now(),
        }
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn cookies(&self) -> &[SessionCookie] {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&SessionCookie> {
        self.cookies.iter().find(|cookie| cookie.name == name)
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// How long ago the portal issued this session (zero if the clock went
    /// backwards)
    pub fn age(&self) -> Seconds {
        self.created_at.elapsed().unwrap_or_default()
    }

    /// A session without any cookie cannot authorize anything
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Formats the cookies as the value of a `Cookie` request header
    pub fn cookie_header(&self) -> SecretString {
        self.cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value.expose_secret()))
            .collect::<Vec<_>>()
            .join("; ")
            .into()
    }
}

impl SessionCookie {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: SecretString::from(value.into()),
        }
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("cookie_names", &self.cookies.iter().map(|c| &c.name).collect::<Vec<_>>())
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
