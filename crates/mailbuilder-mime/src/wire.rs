//! MIME wire format output.
//!
//! Renders a [`MimeNode`] as the header block and body of a MIME entity.
//! The result starts with the part headers (`Content-Type`,
//! `Content-Transfer-Encoding`, ...) so a message writer can put its own
//! RFC 5322 headers in front of it.

use crate::content::DEFAULT_CHARSET;
use crate::content_type::ContentType;
use crate::encoding::{TransferEncoding, encode_rfc2047};
use crate::header::Headers;
use crate::node::{Container, Leaf, LeafBody, MimeNode};
use encoding_rs::Encoding;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::borrow::Cow;

/// Length of generated boundaries.
const BOUNDARY_LENGTH: usize = 40;

/// Creates a random multipart boundary.
#[must_use]
pub fn random_boundary() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_LENGTH)
        .map(char::from)
        .collect();
    format!("mb_{random}")
}

/// Renders a node using random boundaries.
#[must_use]
pub fn render(node: &MimeNode) -> String {
    render_with(node, &mut random_boundary)
}

/// Renders a node to bytes using random boundaries.
#[must_use]
pub fn to_bytes(node: &MimeNode) -> Vec<u8> {
    render(node).into_bytes()
}

/// Renders a node, taking boundaries from `next_boundary`.
///
/// Each container asks for one boundary, outermost first.
#[must_use]
pub fn render_with(node: &MimeNode, next_boundary: &mut dyn FnMut() -> String) -> String {
    let mut out = String::new();
    write_node(&mut out, node, next_boundary);
    out
}

/// Appends a rendered node to `out`.
pub fn write_node(out: &mut String, node: &MimeNode, next_boundary: &mut dyn FnMut() -> String) {
    match node {
        MimeNode::Leaf(leaf) => write_leaf(out, leaf),
        MimeNode::Container(container) => write_container(out, container, next_boundary),
    }
}

fn write_container(
    out: &mut String,
    container: &Container,
    next_boundary: &mut dyn FnMut() -> String,
) {
    let boundary = next_boundary();
    let mut headers = Headers::new();
    headers.add(
        "Content-Type",
        ContentType::multipart(container.kind().subtype(), boundary.as_str()).to_string(),
    );

    out.push_str(&headers.to_string());
    out.push_str("\r\n");

    for child in container.children() {
        out.push_str("--");
        out.push_str(&boundary);
        out.push_str("\r\n");
        write_node(out, child, next_boundary);
    }

    out.push_str("--");
    out.push_str(&boundary);
    out.push_str("--\r\n");
}

fn write_leaf(out: &mut String, leaf: &Leaf) {
    let mut content_type = leaf.content_type.clone();

    let (encoding, body) = match &leaf.body {
        LeafBody::Text(text) => {
            let charset = content_type.charset().unwrap_or(DEFAULT_CHARSET).to_string();
            let (bytes, used_charset) = encode_charset(text, &charset);
            content_type.set_parameter("charset", used_charset);
            let encoding = TransferEncoding::for_text(&bytes);
            (encoding, encoding.encode(&bytes))
        }
        LeafBody::Binary(data) => {
            let encoding = TransferEncoding::Base64;
            (encoding, encoding.encode(data))
        }
    };

    let mut headers = Headers::new();
    headers.add("Content-Type", content_type.to_string());
    headers.add("Content-Transfer-Encoding", encoding.to_string());
    if let Some(name) = &leaf.file_name {
        headers.add("Content-Disposition", attachment_disposition(name));
    }
    headers.extend(&leaf.headers);

    out.push_str(&headers.to_string());
    out.push_str("\r\n");
    out.push_str(&body);
    if !body.ends_with("\r\n") {
        out.push_str("\r\n");
    }
}

/// Encodes text in the named charset.
///
/// Unknown charset labels fall back to UTF-8; the returned label is the one
/// that matches the produced bytes.
fn encode_charset<'a>(text: &'a str, label: &str) -> (Cow<'a, [u8]>, String) {
    let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
        tracing::warn!(charset = label, "Unknown charset, sending as utf-8");
        return (Cow::Borrowed(text.as_bytes()), DEFAULT_CHARSET.to_string());
    };

    let (bytes, used, had_errors) = encoding.encode(text);
    if had_errors {
        tracing::debug!(
            charset = used.name(),
            "Unmappable characters replaced with character references"
        );
    }

    // Keep the caller's spelling when the label was honored.
    let used_charset = if used == encoding {
        label.to_string()
    } else {
        used.name().to_lowercase()
    };
    (bytes, used_charset)
}

fn attachment_disposition(name: &str) -> String {
    let encoded = encode_rfc2047(name, DEFAULT_CHARSET);
    let escaped = encoded.replace('\\', "\\\\").replace('"', "\\\"");
    format!("attachment; filename=\"{escaped}\"")
}
