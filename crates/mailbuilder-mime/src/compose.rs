//! MIME composition engine.
//!
//! Chooses the multipart nesting for a message body:
//!
//! ```text
//! mixed                      (only with attachments)
//! ├── alternative            (only with inline images and a plain text)
//! │   ├── text/plain
//! │   └── related            (only with inline images)
//! │       ├── text/html
//! │       └── image/*  ...
//! └── attachment ...
//! ```
//!
//! Without inline images the HTML leaf is used on its own and an explicit
//! plain text body is not included. Without HTML the body is a single
//! `text/plain` leaf, empty if no plain text was given either.

use crate::content::{BinaryContent, DEFAULT_CHARSET, StringContent};
use crate::content_type::ContentType;
use crate::error::Result;
use crate::node::{Container, Leaf, MimeNode, MultipartKind};
use crate::reduce::HtmlToPlain;
use bytes::Bytes;
use std::borrow::Cow;

/// Resolves the plain text body.
///
/// An explicit non-empty plain text wins. Otherwise, when HTML is present
/// and a converter is configured, the converted HTML is used with the HTML
/// charset. Otherwise the explicit value is returned as given.
#[must_use]
pub fn resolve_plain<'a>(
    plain: Option<&'a StringContent>,
    html: Option<&StringContent>,
    reducer: Option<&dyn HtmlToPlain>,
) -> Option<Cow<'a, StringContent>> {
    if plain.is_some_and(|p| !p.is_empty()) {
        return plain.map(Cow::Borrowed);
    }

    match (html.filter(|h| !h.is_empty()), reducer) {
        (Some(html), Some(reducer)) => {
            let derived = reducer.convert(html.data());
            tracing::debug!(len = derived.len(), "Derived plain text from HTML");
            Some(Cow::Owned(StringContent::with_charset(
                derived,
                html.charset(),
            )))
        }
        _ => plain.map(Cow::Borrowed),
    }
}

/// Composes the message body tree.
///
/// All payloads are read before anything is assembled; if one of them
/// fails, the whole call fails and no tree is returned.
///
/// # Errors
///
/// Returns [`crate::Error::Payload`] if an inline image or attachment
/// payload cannot be read.
pub fn compose(
    plain: Option<&StringContent>,
    html: Option<&StringContent>,
    inline_images: &[BinaryContent],
    attachments: &[BinaryContent],
) -> Result<MimeNode> {
    let html = html.filter(|h| !h.is_empty());

    // Images only ever end up next to an HTML body.
    let images = if html.is_some() {
        read_all(inline_images)?
    } else {
        Vec::new()
    };
    let attached = read_all(attachments)?;

    let body: MimeNode = match html {
        None => plain_leaf(plain).into(),
        Some(html) if images.is_empty() => html_leaf(html).into(),
        Some(html) => {
            let mut related = Container::new(MultipartKind::Related, html_leaf(html).into());
            for (image, data) in inline_images.iter().zip(images) {
                related.push(image_leaf(image, data).into());
            }

            match plain.filter(|p| !p.is_empty()) {
                Some(plain) => {
                    let mut alternative =
                        Container::new(MultipartKind::Alternative, plain_leaf(Some(plain)).into());
                    alternative.push(related.into());
                    alternative.into()
                }
                None => related.into(),
            }
        }
    };

    tracing::debug!(
        html = html.is_some(),
        inline_images = inline_images.len(),
        attachments = attachments.len(),
        root = ?body.kind(),
        "Composed message body"
    );

    if attached.is_empty() {
        return Ok(body);
    }

    let mut mixed = Container::new(MultipartKind::Mixed, body);
    for (attachment, data) in attachments.iter().zip(attached) {
        mixed.push(attachment_leaf(attachment, data).into());
    }
    Ok(mixed.into())
}

fn read_all(contents: &[BinaryContent]) -> Result<Vec<Bytes>> {
    contents.iter().map(BinaryContent::read_payload).collect()
}

fn plain_leaf(plain: Option<&StringContent>) -> Leaf {
    let (text, charset) = plain.map_or(("", DEFAULT_CHARSET), |p| (p.data(), p.charset()));
    Leaf::text(ContentType::text_plain(charset_or_default(charset)), text)
}

fn html_leaf(html: &StringContent) -> Leaf {
    Leaf::text(
        ContentType::text_html(charset_or_default(html.charset())),
        html.data(),
    )
}

fn image_leaf(image: &BinaryContent, data: Bytes) -> Leaf {
    let mut leaf = Leaf::binary(ContentType::parse_or_octet_stream(image.content_type()), data);
    if let Some(id) = image.content_id() {
        leaf.headers.add("Content-ID", bracket_content_id(id));
    }
    leaf
}

fn attachment_leaf(attachment: &BinaryContent, data: Bytes) -> Leaf {
    let mut leaf = Leaf::binary(
        ContentType::parse_or_octet_stream(attachment.content_type()),
        data,
    );
    leaf.file_name = attachment.name().map(str::to_string);
    leaf
}

fn charset_or_default(charset: &str) -> &str {
    if charset.is_empty() {
        DEFAULT_CHARSET
    } else {
        charset
    }
}

/// Wraps a content id in angle brackets.
///
/// The leading `<` and trailing `>` are checked independently, so an id
/// that is already wrapped is returned unchanged.
#[must_use]
pub fn bracket_content_id(id: &str) -> String {
    let mut bracketed = String::with_capacity(id.len() + 2);
    if !id.starts_with('<') {
        bracketed.push('<');
    }
    bracketed.push_str(id);
    if !id.ends_with('>') {
        bracketed.push('>');
    }
    bracketed
}
