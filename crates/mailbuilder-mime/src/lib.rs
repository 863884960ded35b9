//! # mailbuilder-mime
//!
//! MIME body composition for outgoing email.
//!
//! ## Features
//!
//! - **Composition**: Picks the multipart nesting for plain text, HTML,
//!   inline images, and attachments
//! - **Plain text derivation**: Reduces HTML to a plain text alternative
//! - **Wire output**: Renders the composed tree with transfer encodings and
//!   boundaries
//! - **Encoding**: Base64, Quoted-Printable, RFC 2047 header encoding
//!
//! ## Quick Start
//!
//! ```
//! use mailbuilder_mime::{BinaryContent, MultipartKind, StringContent, compose, wire};
//!
//! let html = StringContent::new("<p>Hello <img src=\"cid:logo\"></p>");
//! let images = [BinaryContent::inline_image(&b"\x89PNG"[..], "image/png", "logo")];
//!
//! let body = compose(None, Some(&html), &images, &[])?;
//! assert_eq!(body.kind(), Some(MultipartKind::Related));
//!
//! let rendered = wire::render(&body);
//! assert!(rendered.contains("Content-ID: <logo>"));
//! # Ok::<(), mailbuilder_mime::Error>(())
//! ```
//!
//! ### Deriving plain text
//!
//! ```
//! use mailbuilder_mime::{SimpleHtmlToPlain, StringContent, resolve_plain};
//!
//! let html = StringContent::new("<h1>Title</h1><p>Para</p>");
//! let plain = resolve_plain(None, Some(&html), Some(&SimpleHtmlToPlain));
//! assert_eq!(plain.map(|p| p.data().to_string()).as_deref(), Some("Title\n\nPara"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod compose;
mod content;
mod content_type;
mod error;
mod header;
mod node;
mod reduce;

pub mod encoding;
pub mod wire;

pub use compose::{bracket_content_id, compose, resolve_plain};
pub use content::{BinaryContent, DEFAULT_CHARSET, PayloadSource, StringContent};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Headers, fold};
pub use node::{Container, Leaf, LeafBody, MimeNode, MultipartKind};
pub use reduce::{HtmlToPlain, SimpleHtmlToPlain, html_to_plain, reduce};
