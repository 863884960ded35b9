//! A composed message ready to send.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Local};
use mailbuilder_mime::encoding::encode_rfc2047;
use mailbuilder_mime::{DEFAULT_CHARSET, Headers, MimeNode, wire};
use mailbuilder_smtp::{Envelope, Mailbox};
use rand::Rng;
use rand::distributions::Alphanumeric;

/// Characters that force a display name into quotes (RFC 5322 specials).
const SPECIALS: &str = "()<>[]:;@\\,.\"";

/// A composed message: addressing headers plus the MIME body tree.
///
/// `Bcc` recipients take part in the envelope but never appear in the
/// rendered headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    from: Vec<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    subject: Option<String>,
    date: DateTime<FixedOffset>,
    message_id: String,
    body: MimeNode,
}

impl OutgoingMessage {
    pub(crate) fn new(
        from: Vec<Mailbox>,
        to: Vec<Mailbox>,
        cc: Vec<Mailbox>,
        bcc: Vec<Mailbox>,
        subject: Option<String>,
        body: MimeNode,
    ) -> Self {
        let domain = from.first().map_or("localhost", |m| m.address.domain());
        let message_id = generate_message_id(domain);
        Self {
            from,
            to,
            cc,
            bcc,
            subject,
            date: Local::now().fixed_offset(),
            message_id,
            body,
        }
    }

    /// Replaces the `Date` header value.
    #[must_use]
    pub fn with_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = date;
        self
    }

    /// Returns the senders.
    #[must_use]
    pub fn from(&self) -> &[Mailbox] {
        &self.from
    }

    /// Returns the `To` recipients.
    #[must_use]
    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    /// Returns the `Cc` recipients.
    #[must_use]
    pub fn cc(&self) -> &[Mailbox] {
        &self.cc
    }

    /// Returns the `Bcc` recipients.
    #[must_use]
    pub fn bcc(&self) -> &[Mailbox] {
        &self.bcc
    }

    /// Returns the subject.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the `Date` header value.
    #[must_use]
    pub const fn date(&self) -> DateTime<FixedOffset> {
        self.date
    }

    /// Returns the `Message-ID`, including angle brackets.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Returns the body tree.
    #[must_use]
    pub const fn body(&self) -> &MimeNode {
        &self.body
    }

    /// Builds the SMTP envelope.
    ///
    /// The first sender is the reverse path; recipients are `To`, then
    /// `Cc`, then `Bcc`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSender`] or [`Error::NoRecipients`] if either
    /// side is missing.
    pub fn envelope(&self) -> Result<Envelope> {
        let from = self.from.first().ok_or(Error::NoSender)?;
        let recipients: Vec<_> = self
            .to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|mailbox| mailbox.address.clone())
            .collect();
        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }
        Ok(Envelope::new(from.address.clone(), recipients))
    }

    /// Returns the top-level message headers, without the body headers.
    #[must_use]
    pub fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.add("Date", self.date.to_rfc2822());
        if !self.from.is_empty() {
            headers.add("From", format_mailbox_list(&self.from));
        }
        if !self.to.is_empty() {
            headers.add("To", format_mailbox_list(&self.to));
        }
        if !self.cc.is_empty() {
            headers.add("Cc", format_mailbox_list(&self.cc));
        }
        if let Some(subject) = &self.subject {
            headers.add("Subject", encode_rfc2047(subject, DEFAULT_CHARSET));
        }
        headers.add("Message-ID", self.message_id.clone());
        headers.add("MIME-Version", "1.0");
        headers
    }

    /// Renders the message with random boundaries.
    #[must_use]
    pub fn to_rfc5322(&self) -> Vec<u8> {
        self.render_with(&mut wire::random_boundary).into_bytes()
    }

    /// Renders the message, taking boundaries from `next_boundary`.
    #[must_use]
    pub fn render_with(&self, next_boundary: &mut dyn FnMut() -> String) -> String {
        let mut out = self.headers().to_string();
        wire::write_node(&mut out, &self.body, next_boundary);
        out
    }
}

fn generate_message_id(domain: &str) -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    let timestamp = chrono::Utc::now().timestamp_millis();
    format!("<{timestamp}.{random}@{domain}>")
}

fn format_mailbox_list(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(format_mailbox)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_mailbox(mailbox: &Mailbox) -> String {
    let Some(name) = &mailbox.name else {
        return mailbox.address.to_string();
    };

    let name = if !name.is_ascii() || name.chars().any(|c| c.is_ascii_control()) {
        encode_rfc2047(name, DEFAULT_CHARSET)
    } else if name.chars().any(|c| SPECIALS.contains(c)) {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        name.clone()
    };
    format!("{name} <{}>", mailbox.address)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailbuilder_mime::{ContentType, Leaf};

    fn mailbox(s: &str) -> Mailbox {
        Mailbox::parse(s).unwrap()
    }

    fn message(to: Vec<Mailbox>, cc: Vec<Mailbox>, bcc: Vec<Mailbox>) -> OutgoingMessage {
        let body = Leaf::text(ContentType::text_plain("utf-8"), "Hi").into();
        OutgoingMessage::new(
            vec![mailbox("Alice <alice@example.com>")],
            to,
            cc,
            bcc,
            Some("Hello".to_string()),
            body,
        )
    }

    #[test]
    fn test_envelope_order() {
        let msg = message(
            vec![mailbox("to@example.com")],
            vec![mailbox("cc@example.com")],
            vec![mailbox("bcc@example.com")],
        );
        let envelope = msg.envelope().unwrap();
        assert_eq!(envelope.from.as_str(), "alice@example.com");
        let recipients: Vec<_> = envelope.recipients.iter().map(|a| a.as_str()).collect();
        assert_eq!(recipients, ["to@example.com", "cc@example.com", "bcc@example.com"]);
    }

    #[test]
    fn test_envelope_requires_recipients() {
        let msg = message(vec![], vec![], vec![]);
        assert!(matches!(msg.envelope(), Err(Error::NoRecipients)));
    }

    #[test]
    fn test_bcc_not_in_headers() {
        let msg = message(vec![], vec![], vec![mailbox("hidden@example.com")]);
        let rendered = msg.render_with(&mut || "b".to_string());
        assert!(!rendered.contains("hidden@example.com"));
        assert!(!rendered.contains("Bcc"));
    }

    #[test]
    fn test_rendered_headers() {
        let date = DateTime::parse_from_rfc2822("Tue, 1 Jul 2025 10:52:37 +0200").unwrap();
        let msg = message(vec![mailbox("Bob <bob@example.org>")], vec![], vec![]).with_date(date);
        let rendered = msg.render_with(&mut || "b".to_string());

        assert!(rendered.starts_with("Date: Tue, 1 Jul 2025 10:52:37 +0200\r\n"));
        assert!(rendered.contains("From: Alice <alice@example.com>\r\n"));
        assert!(rendered.contains("To: Bob <bob@example.org>\r\n"));
        assert!(rendered.contains("Subject: Hello\r\n"));
        assert!(rendered.contains("MIME-Version: 1.0\r\nContent-Type: text/plain; charset=utf-8\r\n"));
        assert!(rendered.ends_with("\r\n\r\nHi\r\n"));
    }

    #[test]
    fn test_message_id_uses_sender_domain() {
        let msg = message(vec![], vec![], vec![]);
        assert!(msg.message_id().starts_with('<'));
        assert!(msg.message_id().ends_with("@example.com>"));
    }

    #[test]
    fn test_mailbox_formatting() {
        assert_eq!(format_mailbox(&mailbox("a@b.c")), "a@b.c");
        assert_eq!(
            format_mailbox(&mailbox("\"Doe, Jane\" <jane@b.c>")),
            "\"Doe, Jane\" <jane@b.c>"
        );
        assert_eq!(
            format_mailbox(&Mailbox::with_name("Jürgen", "j@b.c").unwrap()),
            "=?utf-8?B?SsO8cmdlbg==?= <j@b.c>"
        );
    }

    #[test]
    fn test_line_breaks_in_names_stay_inside_the_header() {
        let mut sender = mailbox("eve@example.com");
        sender.name = Some("Eve\r\nBcc: spy@evil.test".to_string());
        let mut msg = message(vec![mailbox("to@example.com")], vec![], vec![]);
        msg.from = vec![sender];
        msg.subject = Some("Hi\r\nBcc: spy@evil.test".to_string());

        let rendered = msg.render_with(&mut || "b".to_string());
        assert!(!rendered.contains("\r\nBcc:"));
        assert!(!rendered.contains("spy@evil.test"));
        assert!(rendered.contains("From: =?utf-8?B?"));
    }

    #[test]
    fn test_non_ascii_subject_is_encoded() {
        let mut msg = message(vec![], vec![], vec![]);
        msg.subject = Some("Grüße".to_string());
        assert_eq!(msg.headers().get("Subject"), Some("=?utf-8?B?R3LDvMOfZQ==?="));
    }
}
