//! MIME transfer and header encodings.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding. Only the
//! encoding direction is provided: messages are produced, never parsed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::{self, Write as _};

/// Maximum encoded line length (RFC 2045).
pub const MAX_LINE_LENGTH: usize = 76;

/// Content transfer encoding of a leaf part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII with short lines, sent as-is.
    SevenBit,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Base64 encoding.
    Base64,
}

impl TransferEncoding {
    /// Picks the encoding for an encoded text body.
    ///
    /// Plain ASCII with lines that fit the limit stays `7bit`; anything else
    /// becomes quoted-printable.
    #[must_use]
    pub fn for_text(text: &[u8]) -> Self {
        let fits = text
            .split(|&b| b == b'\n')
            .all(|line| line.strip_suffix(b"\r").unwrap_or(line).len() <= MAX_LINE_LENGTH);
        let plain_ascii = text
            .iter()
            .all(|&b| b == b'\r' || b == b'\n' || b == b'\t' || (b' '..=b'~').contains(&b));
        if fits && plain_ascii {
            Self::SevenBit
        } else {
            Self::QuotedPrintable
        }
    }

    /// Encodes a body with this encoding.
    ///
    /// Text encodings normalize line breaks to CRLF; Base64 keeps the bytes
    /// as they are.
    #[must_use]
    pub fn encode(self, data: &[u8]) -> String {
        match self {
            Self::SevenBit => String::from_utf8_lossy(&normalize_line_endings(data)).into_owned(),
            Self::QuotedPrintable => encode_quoted_printable(data),
            Self::Base64 => encode_base64_wrapped(data),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF-terminated lines of 76 columns.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);

    // Base64 output is pure ASCII, so byte chunks are valid str boundaries.
    for chunk in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        result.push_str(&String::from_utf8_lossy(chunk));
        result.push_str("\r\n");
    }

    result
}

/// Rewrites bare `\n` and `\r` line breaks as `\r\n`.
#[must_use]
pub fn normalize_line_endings(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut bytes = data.iter().copied().peekable();

    while let Some(byte) = bytes.next() {
        match byte {
            b'\r' => {
                if bytes.peek() == Some(&b'\n') {
                    bytes.next();
                }
                result.extend_from_slice(b"\r\n");
            }
            b'\n' => result.extend_from_slice(b"\r\n"),
            _ => result.push(byte),
        }
    }

    result
}

/// Encodes bytes using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks in the input are kept as hard CRLF breaks; lines longer than
/// the limit get soft breaks. Trailing whitespace before a hard break is
/// encoded so transports cannot strip it.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    let normalized = normalize_line_endings(data);
    let mut result = String::with_capacity(normalized.len());

    let mut lines = normalized.split(|&b| b == b'\n').peekable();
    while let Some(line) = lines.next() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        encode_quoted_printable_line(line, &mut result);
        if lines.peek().is_some() {
            result.push_str("\r\n");
        }
    }

    result
}

fn encode_quoted_printable_line(bytes: &[u8], out: &mut String) {
    let mut line_length = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        let is_last = i + 1 == bytes.len();
        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            b' ' | b'\t' => !is_last,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };

        // Keep room for the trailing '=' of a soft break.
        if line_length + width > MAX_LINE_LENGTH - 1 {
            out.push_str("=\r\n");
            line_length = 0;
        }

        if literal {
            out.push(byte as char);
        } else {
            let _ = write!(out, "={byte:02X}");
        }
        line_length += width;
    }
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Values that are plain ASCII are
/// returned unchanged. Long values are split into several encoded words so
/// each stays under the 75 character limit.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) && !text.contains("=?") {
        return text.to_string();
    }

    // 75 chars per word minus "=?", "?B?", "?=" and the charset name,
    // rounded down to whole base64 quanta.
    let overhead = 7 + charset.len();
    let max_encoded = 75usize.saturating_sub(overhead).max(4) / 4 * 4;
    let max_raw = max_encoded / 4 * 3;

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if chunk.len() + ch.len_utf8() > max_raw {
            words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
    }

    words.join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_wrapped_lines() {
        let data = vec![0u8; 120];
        let encoded = encode_base64_wrapped(&data);
        let lines: Vec<&str> = encoded.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 76);
        assert!(encoded.ends_with("\r\n"));
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings(b"a\nb\r\nc\rd"), b"a\r\nb\r\nc\r\nd");
    }

    #[test]
    fn test_quoted_printable_ascii_untouched() {
        assert_eq!(encode_quoted_printable(b"Hello, World!"), "Hello, World!");
    }

    #[test]
    fn test_quoted_printable_non_ascii() {
        assert_eq!(encode_quoted_printable("Héllo".as_bytes()), "H=C3=A9llo");
        assert_eq!(encode_quoted_printable(b"a=b"), "a=3Db");
    }

    #[test]
    fn test_quoted_printable_keeps_hard_breaks() {
        assert_eq!(encode_quoted_printable(b"one \ntwo"), "one=20\r\ntwo");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        let text = "x".repeat(200);
        let encoded = encode_quoted_printable(text.as_bytes());
        for line in encoded.split("\r\n") {
            assert!(line.len() <= MAX_LINE_LENGTH, "line too long: {line}");
        }
        assert_eq!(encoded.replace("=\r\n", ""), text);
    }

    #[test]
    fn test_transfer_encoding_for_text() {
        assert_eq!(TransferEncoding::for_text(b"Hello\r\nWorld"), TransferEncoding::SevenBit);
        assert_eq!(
            TransferEncoding::for_text("Grüße".as_bytes()),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(
            TransferEncoding::for_text("a".repeat(100).as_bytes()),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
        assert_eq!(TransferEncoding::SevenBit.encode(b"a\nb"), "a\r\nb");
    }

    #[test]
    fn test_rfc2047_plain_ascii() {
        assert_eq!(encode_rfc2047("Hello", "utf-8"), "Hello");
    }

    #[test]
    fn test_rfc2047_non_ascii() {
        assert_eq!(encode_rfc2047("Héllo", "utf-8"), "=?utf-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_rfc2047_splits_long_values() {
        let encoded = encode_rfc2047(&"ü".repeat(60), "utf-8");
        let words: Vec<&str> = encoded.split(' ').collect();
        assert!(words.len() > 1);
        for word in words {
            assert!(word.len() <= 75);
            assert!(word.starts_with("=?utf-8?B?"));
        }
    }
}
