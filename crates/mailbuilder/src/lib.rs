//! # mailbuilder
//!
//! Build multipart emails with a fluent API and send them over SMTP.
//!
//! ## Features
//!
//! - **Fluent builder**: Senders, recipients, subject, plain and HTML bodies
//! - **Inline images**: Referenced from the HTML body by `cid:` URLs
//! - **Attachments**: From memory, text, or files read at build time
//! - **Automatic plain text**: Derived from the HTML body on request
//! - **Delivery**: Any [`Transport`], with [`SmtpTransport`] built in
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailbuilder::{BinaryContent, MailBuilder, SmtpSession, SmtpTransport};
//!
//! #[tokio::main]
//! async fn main() -> mailbuilder::Result<()> {
//!     let transport = SmtpTransport::new(SmtpSession::gmail("me@gmail.com", "app-password"));
//!
//!     MailBuilder::new()
//!         .set_from("Me <me@gmail.com>")
//!         .add_to("you@example.com")
//!         .set_subject("Hello")
//!         .set_body_html("<p>Hello <img src=\"cid:logo\"></p>")
//!         .add_inline_image(BinaryContent::inline_image_from_file("logo.png", "image/png", "logo"))
//!         .enable_auto_plain_from_html()
//!         .build_message_and_send(&transport)
//!         .await
//! }
//! ```
//!
//! ## Crates
//!
//! - [`mime`]: Body composition, HTML reduction, and MIME output
//! - [`smtp`]: Addresses, session settings, and SMTP delivery

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod builder;
mod error;
mod message;

pub use mailbuilder_mime as mime;
pub use mailbuilder_smtp as smtp;

pub use builder::MailBuilder;
pub use error::{Error, Result};
pub use message::OutgoingMessage;

pub use mailbuilder_mime::{
    BinaryContent, HtmlToPlain, MimeNode, MultipartKind, SimpleHtmlToPlain, StringContent,
};
pub use mailbuilder_smtp::{
    Address, Envelope, Mailbox, Security, SmtpSession, SmtpTransport, Transport,
};
