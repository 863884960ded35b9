//! SMTP commands used for message submission.

use crate::types::Address;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH PLAIN with an initial response (RFC 4616)
    AuthPlain {
        /// Base64 of `\0username\0password`
        initial_response: String,
    },
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        from: Address,
        /// Announce an 8-bit body (`BODY=8BITMIME`)
        eight_bit: bool,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: Address,
    },
    /// DATA - Begin message data
    Data,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Builds an `AUTH PLAIN` command for the given credentials.
    #[must_use]
    pub fn auth_plain(username: &str, password: &str) -> Self {
        let credentials = format!("\0{username}\0{password}");
        Self::AuthPlain {
            initial_response: STANDARD.encode(credentials.as_bytes()),
        }
    }

    /// Returns the command verb, safe to log.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Ehlo { .. } => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::AuthPlain { .. } => "AUTH PLAIN",
            Self::MailFrom { .. } => "MAIL FROM",
            Self::RcptTo { .. } => "RCPT TO",
            Self::Data => "DATA",
            Self::Quit => "QUIT",
        }
    }

    /// Serializes the command to a CRLF-terminated line.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::AuthPlain { initial_response } => format!("AUTH PLAIN {initial_response}"),
            Self::MailFrom { from, eight_bit } => {
                let body = if *eight_bit { " BODY=8BITMIME" } else { "" };
                format!("MAIL FROM:<{from}>{body}")
            }
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::StartTls | Self::Data | Self::Quit => self.verb().to_string(),
        };

        let mut buf = line.into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }
}

/// Prepares a message for the DATA phase.
///
/// Line breaks become CRLF, lines starting with `.` get an extra `.`
/// (RFC 5321 section 4.5.2) and the terminating `.` line is appended.
#[must_use]
pub fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 5);

    if !message.is_empty() {
        let body = message.strip_suffix(b"\n").unwrap_or(message);
        let body = body.strip_suffix(b"\r").unwrap_or(body);

        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}
