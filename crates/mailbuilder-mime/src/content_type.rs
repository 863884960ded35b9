//! MIME content type handling.

use crate::error::{Error, Result};
use std::fmt;

/// MIME content type with parameters.
///
/// Parameters keep their insertion order so rendered headers are stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a `text/plain` content type with the given charset.
    #[must_use]
    pub fn text_plain(charset: &str) -> Self {
        Self::new("text", "plain").with_parameter("charset", charset)
    }

    /// Creates a `text/html` content type with the given charset.
    #[must_use]
    pub fn text_html(charset: &str) -> Self {
        Self::new("text", "html").with_parameter("charset", charset)
    }

    /// Creates a `multipart/<subtype>` content type with boundary.
    #[must_use]
    pub fn multipart(sub_type: &str, boundary: impl Into<String>) -> Self {
        Self::new("multipart", sub_type).with_parameter("boundary", boundary)
    }

    /// The fallback for binary payloads without a usable type.
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Sets a parameter, replacing an existing value with the same key.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(key, value);
        self
    }

    /// Sets a parameter in place.
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into().to_lowercase();
        let value = value.into();
        match self.parameters.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((key, value)),
        }
    }

    /// Returns a parameter value by (case-insensitive) key.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns the `type/subtype` pair without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .map(|(main, sub)| (main.trim(), sub.trim()))
            .filter(|(main, sub)| is_token(main) && is_token(sub))
            .ok_or_else(|| Error::InvalidContentType(s.to_string()))?;

        let mut content_type = Self::new(main_type.to_lowercase(), sub_type.to_lowercase());

        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                content_type.set_parameter(key.trim(), value.trim().trim_matches('"'));
            }
        }

        Ok(content_type)
    }

    /// Parses a content type, falling back to `application/octet-stream`.
    #[must_use]
    pub fn parse_or_octet_stream(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|e| {
            tracing::debug!(%e, "Falling back to application/octet-stream");
            Self::octet_stream()
        })
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?=".contains(c))
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        for (key, value) in &self.parameters {
            if value.is_empty() || !is_token(value) {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "; {key}=\"{escaped}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_plain() {
        let ct = ContentType::text_plain("utf-8");
        assert_eq!(ct.essence(), "text/plain");
        assert_eq!(ct.charset(), Some("utf-8"));
        assert!(ct.is_text());
    }

    #[test]
    fn test_multipart_related() {
        let ct = ContentType::multipart("related", "b1");
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("b1"));
        assert_eq!(ct.to_string(), "multipart/related; boundary=b1");
    }

    #[test]
    fn test_parse_with_parameters() {
        let ct = ContentType::parse("Image/PNG; name=\"logo.png\"").unwrap();
        assert_eq!(ct.essence(), "image/png");
        assert_eq!(ct.parameter("name"), Some("logo.png"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("image").is_err());
        assert!(ContentType::parse("image/").is_err());
        assert_eq!(
            ContentType::parse_or_octet_stream("not a type"),
            ContentType::octet_stream()
        );
    }

    #[test]
    fn test_display_quotes_special_values() {
        let ct = ContentType::new("application", "pdf").with_parameter("name", "Q3 report.pdf");
        assert_eq!(ct.to_string(), "application/pdf; name=\"Q3 report.pdf\"");
    }

    #[test]
    fn test_set_parameter_replaces() {
        let ct = ContentType::text_html("utf-8").with_parameter("Charset", "iso-8859-1");
        assert_eq!(ct.charset(), Some("iso-8859-1"));
        assert_eq!(ct.to_string(), "text/html; charset=iso-8859-1");
    }
}
