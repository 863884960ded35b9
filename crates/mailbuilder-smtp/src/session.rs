//! SMTP session settings.
//!
//! A session names the server, how to secure the connection, and the
//! optional credentials. It can be built from presets or read from TOML:
//!
//! ```toml
//! host = "smtp.example.com"
//! port = 587
//! security = "starttls"
//! username = "me@example.com"
//! password = "secret"
//! ```

use crate::error::Result;
use serde::Deserialize;
use std::time::Duration;

/// Default client name sent with `EHLO`.
pub const DEFAULT_HELLO_NAME: &str = "localhost";

/// Default reply timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// Plain TCP, no encryption.
    None,
    /// Implicit TLS from the first byte.
    #[default]
    Tls,
    /// Plain TCP upgraded with `STARTTLS`.
    StartTls,
}

impl Security {
    /// Returns the conventional port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::Tls => 465,
            Self::StartTls => 587,
        }
    }
}

/// Settings for one SMTP server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmtpSession {
    /// Server hostname.
    pub host: String,
    /// Server port. Defaults to the port of the security mode.
    #[serde(default)]
    pub port: Option<u16>,
    /// Connection security.
    #[serde(default)]
    pub security: Security,
    /// Login name for `AUTH PLAIN`.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for `AUTH PLAIN`.
    #[serde(default)]
    pub password: Option<String>,
    /// Name sent with `EHLO`.
    #[serde(default = "default_hello_name")]
    pub hello_name: String,
    /// Maximum wait for each server reply, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_hello_name() -> String {
    DEFAULT_HELLO_NAME.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl SmtpSession {
    /// Creates a session using implicit TLS on port 465.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: Some(Security::Tls.default_port()),
            security: Security::Tls,
            username: Some(username.into()),
            password: Some(password.into()),
            hello_name: default_hello_name(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Creates a session on an explicit port.
    ///
    /// Port 465 uses implicit TLS; any other port uses `STARTTLS`.
    #[must_use]
    pub fn with_port(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let security = if port == Security::Tls.default_port() {
            Security::Tls
        } else {
            Security::StartTls
        };
        Self {
            port: Some(port),
            security,
            ..Self::new(host, username, password)
        }
    }

    /// Creates a session for Gmail (`smtp.gmail.com:587` with `STARTTLS`).
    #[must_use]
    pub fn gmail(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_port("smtp.gmail.com", 587, username, password)
    }

    /// Creates a session without credentials or encryption.
    #[must_use]
    pub fn unauthenticated(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port: Some(port),
            security: Security::None,
            username: None,
            password: None,
            hello_name: default_hello_name(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Reads a session from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the TOML is invalid or misses
    /// the host.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Sets the reply timeout.
    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the name sent with `EHLO`.
    #[must_use]
    pub fn hello_name(mut self, name: impl Into<String>) -> Self {
        self.hello_name = name.into();
        self
    }

    /// Returns the port to connect to.
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.security.default_port())
    }

    /// Returns the reply timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the credentials when both parts are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username.as_deref().zip(self.password.as_deref())
    }
}
