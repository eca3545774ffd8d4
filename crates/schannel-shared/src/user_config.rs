//! The durable per-user configuration.
//!
//! Every field has a default so that a file written by an older version (or
//! edited by hand) still loads.

use std::fmt::{Debug, Display};

use secrecy::{ExposeSecret as _, SecretString};
use serde::Serializer;

use crate::account::NodeId;

#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserConfig {
    /// Relay node chosen by the user (or by reconciliation after a refresh)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_node: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

/// Proxy used to reach the portal
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub scheme: ProxyScheme,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_secret"
    )]
    pub password: Option<SecretString>,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProxyScheme {
    #[default]
    Socks5,
    Http,
    Https,
}

impl UserConfig {
    pub fn with_selected_node(mut self, node: Option<NodeId>) -> Self {
        self.selected_node = node;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.proxy = proxy;
        self
    }
}

impl ProxyConfig {
    pub fn new<S: Into<String>>(scheme: ProxyScheme, host: S, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
            username: None,
            password: None,
        }
    }

    pub fn with_auth<S: Into<String>>(mut self, username: S, password: SecretString) -> Self {
        self.username = Some(username.into());
        self.password = Some(password);
        self
    }

    pub fn has_auth(&self) -> bool {
        self.username.is_some()
    }

    /// Full proxy url including credentials, kept secret because of them
    pub fn to_url(&self) -> SecretString {
        let auth = match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                format!("{username}:{}@", password.expose_secret())
            }
            (Some(username), None) => format!("{username}@"),
            (None, _) => String::new(),
        };
        format!("{}://{auth}{}:{}", self.scheme, self.host, self.port).into()
    }
}

/// Redacts the password
impl Display for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.username {
            Some(username) => write!(
                f,
                "{}://{username}:***@{}:{}",
                self.scheme, self.host, self.port
            ),
            None => write!(f, "{}://{}:{}", self.scheme, self.host, self.port),
        }
    }
}

impl Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

fn serialize_opt_secret<S: Serializer>(
    value: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}
