//! MIME header handling.

use std::fmt;

/// Preferred maximum header line length (RFC 5322 section 2.1.1).
const FOLD_WIDTH: usize = 78;

/// Ordered collection of email headers.
///
/// Names keep the spelling they were added with; lookups are
/// case-insensitive. Output order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Sets a header value, replacing any existing values.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.entries.push((name, value.into()));
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Appends all headers of `other`.
    pub fn extend(&mut self, other: &Self) {
        self.entries.extend(other.entries.iter().cloned());
    }
}

/// Folds a `Name: value` line at whitespace so lines stay near 78 columns.
///
/// A line break is only ever inserted in front of existing whitespace, so
/// unfolding gives back the value exactly. Words longer than the limit are
/// left intact.
#[must_use]
pub fn fold(name: &str, value: &str) -> String {
    let mut out = String::with_capacity(name.len() + value.len() + 4);
    out.push_str(name);
    out.push_str(": ");
    let start = out.len();
    let mut line_length = start;

    for chunk in whitespace_chunks(value) {
        let has_content = out.len() > start && line_length > 0;
        if line_length + chunk.len() > FOLD_WIDTH
            && has_content
            && chunk.starts_with([' ', '\t'])
        {
            out.push_str("\r\n");
            line_length = 0;
        }
        out.push_str(chunk);
        line_length += chunk.len();
    }

    out
}

/// Splits `value` in front of every whitespace run. Each piece after the
/// first starts with its whitespace; concatenating the pieces gives `value`.
fn whitespace_chunks(value: &str) -> Vec<&str> {
    let is_wsp = |b: u8| b == b' ' || b == b'\t';
    let bytes = value.as_bytes();
    let mut chunks = Vec::new();
    let mut start = 0;
    for i in 1..bytes.len() {
        if is_wsp(bytes[i]) && !is_wsp(bytes[i - 1]) {
            chunks.push(&value[start..i]);
            start = i;
        }
    }
    if start < value.len() {
        chunks.push(&value[start..]);
    }
    chunks
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{}\r\n", fold(name, value))?;
        }
        Ok(())
    }
}
