//! SMTP reply types and parsing.

use crate::error::{Error, Result};

/// SMTP reply from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 250).
    pub code: ReplyCode,
    /// Reply message lines, without code and separator.
    pub message: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// Parses a reply from its raw lines (line endings already removed).
    ///
    /// Every line must carry the same code. Continuation lines use `-` after
    /// the code, the last line uses a space or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the reply is empty or malformed.
    pub fn parse(lines: &[String]) -> Result<Self> {
        let Some(first) = lines.first() else {
            return Err(Error::Protocol("Empty reply".into()));
        };
        let code = parse_code(first)?;

        let mut message = Vec::with_capacity(lines.len());
        for line in lines {
            if parse_code(line)? != code {
                return Err(Error::Protocol(format!("Mixed reply codes: {line}")));
            }
            match line.as_bytes().get(3) {
                None => message.push(String::new()),
                Some(b' ' | b'-') => message.push(line[4..].to_string()),
                Some(_) => return Err(Error::Protocol(format!("Malformed reply line: {line}"))),
            }
        }

        Ok(Self::new(code, message))
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the full message as a single string.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }
}

fn parse_code(line: &str) -> Result<ReplyCode> {
    let code = line
        .get(..3)
        .filter(|code| code.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::Protocol(format!("Invalid reply line: {line}")))?;
    code.parse::<u16>()
        .map(ReplyCode::new)
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code}")))
}

/// Checks if a line is the last line of a reply.
///
/// Continuation lines have a `-` right after the code.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.as_bytes().get(3) != Some(&b'-')
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded
    pub const AUTH_SUCCESS: Self = Self(235);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
