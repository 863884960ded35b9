//! # mailbuilder-smtp
//!
//! A small SMTP submission client (RFC 5321) for delivering composed
//! messages.
//!
//! ## Features
//!
//! - **TLS support**: Both implicit TLS (port 465) and STARTTLS
//! - **Authentication**: AUTH PLAIN
//! - **Configuration**: Session presets or TOML
//! - **Timeouts**: Every reply is bounded by the session timeout
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailbuilder_smtp::{Address, Envelope, SmtpSession, SmtpTransport, Transport};
//!
//! #[tokio::main]
//! async fn main() -> mailbuilder_smtp::Result<()> {
//!     let transport = SmtpTransport::new(SmtpSession::gmail("me@gmail.com", "app-password"));
//!
//!     let envelope = Envelope::new(
//!         Address::new("me@gmail.com")?,
//!         vec![Address::new("you@example.com")?],
//!     );
//!     let message = b"Subject: Test\r\n\r\nHello, World!\r\n";
//!
//!     transport.send(&envelope, message).await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: Command/reply dialogue and TLS setup
//! - [`session`]: Server settings
//! - [`transport`]: The [`Transport`] seam and its SMTP implementation
//! - [`types`]: Addresses and replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod session;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use session::{Security, SmtpSession};
pub use transport::{Envelope, SmtpTransport, Transport};
pub use types::{Address, Mailbox, Reply, ReplyCode};
