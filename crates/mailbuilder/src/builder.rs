//! Fluent message builder.

use crate::error::{Error, Result};
use crate::message::OutgoingMessage;
use mailbuilder_mime::{
    BinaryContent, HtmlToPlain, MimeNode, SimpleHtmlToPlain, StringContent, compose,
    resolve_plain,
};
use mailbuilder_smtp::{Mailbox, Transport};
use std::fmt;
use std::sync::Arc;

/// Collects addresses, subject, bodies, inline images, and attachments,
/// then composes them into a message.
///
/// Setters take `&mut self` and return `&mut Self` so calls can be chained.
/// Addresses given as strings are parsed with [`Mailbox::parse`]; malformed
/// ones are dropped (and logged at `debug` level).
///
/// ```
/// use mailbuilder::{BinaryContent, MailBuilder};
///
/// let mut builder = MailBuilder::new();
/// builder
///     .set_from("Alice <alice@example.com>")
///     .add_to("bob@example.org")
///     .set_subject("Report")
///     .set_body_html("<h1>Report</h1><p>See attachment.</p>")
///     .enable_auto_plain_from_html()
///     .add_attachment(BinaryContent::attachment(&b"%PDF"[..], "application/pdf", "r.pdf"));
///
/// let message = builder.build_message()?;
/// assert_eq!(message.to().len(), 1);
/// # Ok::<(), mailbuilder::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct MailBuilder {
    from: Vec<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    subject: Option<String>,
    plain: Option<StringContent>,
    html: Option<StringContent>,
    plain_converter: Option<Arc<dyn HtmlToPlain>>,
    inline_images: Vec<BinaryContent>,
    attachments: Vec<BinaryContent>,
}

fn push_parsed(list: &mut Vec<Mailbox>, field: &'static str, address: &str) {
    match Mailbox::parse(address) {
        Ok(mailbox) => list.push(mailbox),
        Err(error) => tracing::debug!(field, address, %error, "Dropping malformed address"),
    }
}

fn replace_parsed(list: &mut Vec<Mailbox>, field: &'static str, address: &str) {
    list.clear();
    if !address.trim().is_empty() {
        push_parsed(list, field, address);
    }
}

impl MailBuilder {
    /// Creates an empty builder. Automatic plain text is disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sender.
    pub fn add_from(&mut self, address: &str) -> &mut Self {
        push_parsed(&mut self.from, "from", address);
        self
    }

    /// Adds an already parsed sender.
    pub fn add_from_mailbox(&mut self, mailbox: Mailbox) -> &mut Self {
        self.from.push(mailbox);
        self
    }

    /// Replaces all senders with `address`. An empty string only clears.
    pub fn set_from(&mut self, address: &str) -> &mut Self {
        replace_parsed(&mut self.from, "from", address);
        self
    }

    /// Removes all senders.
    pub fn clear_from(&mut self) -> &mut Self {
        self.from.clear();
        self
    }

    /// Adds a `To` recipient.
    pub fn add_to(&mut self, address: &str) -> &mut Self {
        push_parsed(&mut self.to, "to", address);
        self
    }

    /// Adds several `To` recipients.
    pub fn add_to_all<'a>(&mut self, addresses: impl IntoIterator<Item = &'a str>) -> &mut Self {
        for address in addresses {
            push_parsed(&mut self.to, "to", address);
        }
        self
    }

    /// Adds an already parsed `To` recipient.
    pub fn add_to_mailbox(&mut self, mailbox: Mailbox) -> &mut Self {
        self.to.push(mailbox);
        self
    }

    /// Replaces all `To` recipients with `address`.
    pub fn set_to(&mut self, address: &str) -> &mut Self {
        replace_parsed(&mut self.to, "to", address);
        self
    }

    /// Removes all `To` recipients.
    pub fn clear_to(&mut self) -> &mut Self {
        self.to.clear();
        self
    }

    /// Adds a `Cc` recipient.
    pub fn add_cc(&mut self, address: &str) -> &mut Self {
        push_parsed(&mut self.cc, "cc", address);
        self
    }

    /// Adds an already parsed `Cc` recipient.
    pub fn add_cc_mailbox(&mut self, mailbox: Mailbox) -> &mut Self {
        self.cc.push(mailbox);
        self
    }

    /// Replaces all `Cc` recipients with `address`.
    pub fn set_cc(&mut self, address: &str) -> &mut Self {
        replace_parsed(&mut self.cc, "cc", address);
        self
    }

    /// Removes all `Cc` recipients.
    pub fn clear_cc(&mut self) -> &mut Self {
        self.cc.clear();
        self
    }

    /// Adds a `Bcc` recipient.
    pub fn add_bcc(&mut self, address: &str) -> &mut Self {
        push_parsed(&mut self.bcc, "bcc", address);
        self
    }

    /// Adds an already parsed `Bcc` recipient.
    pub fn add_bcc_mailbox(&mut self, mailbox: Mailbox) -> &mut Self {
        self.bcc.push(mailbox);
        self
    }

    /// Replaces all `Bcc` recipients with `address`.
    pub fn set_bcc(&mut self, address: &str) -> &mut Self {
        replace_parsed(&mut self.bcc, "bcc", address);
        self
    }

    /// Removes all `Bcc` recipients.
    pub fn clear_bcc(&mut self) -> &mut Self {
        self.bcc.clear();
        self
    }

    /// Sets the subject.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the plain text body.
    pub fn set_body_plain(&mut self, plain: impl Into<StringContent>) -> &mut Self {
        self.plain = Some(plain.into());
        self
    }

    /// Removes the plain text body.
    pub fn clear_body_plain(&mut self) -> &mut Self {
        self.plain = None;
        self
    }

    /// Sets the HTML body.
    pub fn set_body_html(&mut self, html: impl Into<StringContent>) -> &mut Self {
        self.html = Some(html.into());
        self
    }

    /// Removes the HTML body.
    pub fn clear_body_html(&mut self) -> &mut Self {
        self.html = None;
        self
    }

    /// Derives the plain text from the HTML when no plain text is set,
    /// using [`SimpleHtmlToPlain`].
    pub fn enable_auto_plain_from_html(&mut self) -> &mut Self {
        self.plain_converter = Some(Arc::new(SimpleHtmlToPlain));
        self
    }

    /// Derives the plain text from the HTML with a custom converter.
    pub fn enable_auto_plain_from_html_with(
        &mut self,
        converter: impl HtmlToPlain + 'static,
    ) -> &mut Self {
        self.plain_converter = Some(Arc::new(converter));
        self
    }

    /// Stops deriving plain text from HTML.
    pub fn disable_auto_plain_from_html(&mut self) -> &mut Self {
        self.plain_converter = None;
        self
    }

    /// Adds an inline image for the HTML body.
    pub fn add_inline_image(&mut self, image: BinaryContent) -> &mut Self {
        self.inline_images.push(image);
        self
    }

    /// Adds several inline images.
    pub fn add_inline_images(
        &mut self,
        images: impl IntoIterator<Item = BinaryContent>,
    ) -> &mut Self {
        self.inline_images.extend(images);
        self
    }

    /// Removes all inline images.
    pub fn clear_inline_images(&mut self) -> &mut Self {
        self.inline_images.clear();
        self
    }

    /// Adds an attachment.
    pub fn add_attachment(&mut self, attachment: BinaryContent) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    /// Adds several attachments.
    pub fn add_attachments(
        &mut self,
        attachments: impl IntoIterator<Item = BinaryContent>,
    ) -> &mut Self {
        self.attachments.extend(attachments);
        self
    }

    /// Removes all attachments.
    pub fn clear_attachments(&mut self) -> &mut Self {
        self.attachments.clear();
        self
    }

    /// Composes the body tree from the current content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Composition`] if a payload cannot be read.
    pub fn build_body(&self) -> Result<MimeNode> {
        let plain = resolve_plain(
            self.plain.as_ref(),
            self.html.as_ref(),
            self.plain_converter.as_deref(),
        );
        Ok(compose(
            plain.as_deref(),
            self.html.as_ref(),
            &self.inline_images,
            &self.attachments,
        )?)
    }

    /// Builds the message from whatever has been set.
    ///
    /// Missing senders or recipients are not an error here; the message
    /// is only checked when it is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Composition`] if a payload cannot be read.
    pub fn build_message(&self) -> Result<OutgoingMessage> {
        let body = self.build_body()?;
        Ok(OutgoingMessage::new(
            self.from.clone(),
            self.to.clone(),
            self.cc.clone(),
            self.bcc.clone(),
            self.subject.clone(),
            body,
        ))
    }

    /// Builds the message and hands it to `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSender`] or [`Error::NoRecipients`] for an
    /// incomplete message, [`Error::Composition`] if a payload cannot be
    /// read, and [`Error::Transport`] if delivery fails.
    pub async fn build_message_and_send(&self, transport: &impl Transport) -> Result<()> {
        let message = self.build_message()?;
        let envelope = message.envelope()?;
        let bytes = message.to_rfc5322();

        if let Err(error) = transport.send(&envelope, &bytes).await {
            tracing::warn!(%error, message_id = message.message_id(), "Sending failed");
            return Err(Error::Transport(error));
        }

        tracing::info!(
            message_id = message.message_id(),
            recipients = envelope.recipients.len(),
            "Message sent"
        );
        Ok(())
    }
}

impl fmt::Debug for MailBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailBuilder")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("cc", &self.cc)
            .field("bcc", &self.bcc)
            .field("subject", &self.subject)
            .field("plain", &self.plain)
            .field("html", &self.html)
            .field("auto_plain", &self.plain_converter.is_some())
            .field("inline_images", &self.inline_images.len())
            .field("attachments", &self.attachments.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailbuilder_mime::MultipartKind;

    #[test]
    fn test_malformed_addresses_are_dropped() {
        let mut builder = MailBuilder::new();
        builder
            .add_to("good@example.com")
            .add_to("not an address")
            .add_to("")
            .add_cc("Carol <carol@example.com>");
        assert_eq!(builder.to.len(), 1);
        assert_eq!(builder.cc[0].name.as_deref(), Some("Carol"));
    }

    #[test]
    fn test_set_replaces_and_empty_clears() {
        let mut builder = MailBuilder::new();
        builder.add_from("a@example.com").add_from("b@example.com");
        builder.set_from("c@example.com");
        assert_eq!(builder.from.len(), 1);
        assert_eq!(builder.from[0].address.as_str(), "c@example.com");

        builder.set_from("");
        assert!(builder.from.is_empty());
    }

    #[test]
    fn test_add_to_all() {
        let mut builder = MailBuilder::new();
        builder.add_to_all(["a@example.com", "bad", "b@example.com"]);
        assert_eq!(builder.to.len(), 2);
        builder.clear_to();
        assert!(builder.to.is_empty());
    }

    #[test]
    fn test_clear_attachments_clears() {
        let mut builder = MailBuilder::new();
        builder
            .add_attachment(BinaryContent::text_attachment(Some("x"), "text/plain", "x.txt"))
            .clear_attachments();
        assert!(builder.attachments.is_empty());
    }

    #[test]
    fn test_empty_builder_builds_empty_plain_body() {
        let body = MailBuilder::new().build_body().unwrap();
        assert!(body.is_leaf());
        assert_eq!(body.text(), Some(""));
    }

    #[test]
    fn test_auto_plain_with_inline_images() {
        let mut builder = MailBuilder::new();
        builder
            .set_body_html("<p>Hi</p>")
            .add_inline_image(BinaryContent::inline_image(&b"png"[..], "image/png", "i"))
            .enable_auto_plain_from_html();
        let body = builder.build_body().unwrap();
        assert_eq!(body.kind(), Some(MultipartKind::Alternative));
        assert_eq!(body.children()[0].text(), Some("Hi"));

        builder.disable_auto_plain_from_html();
        let body = builder.build_body().unwrap();
        assert_eq!(body.kind(), Some(MultipartKind::Related));
    }

    #[test]
    fn test_custom_converter() {
        let mut builder = MailBuilder::new();
        builder
            .set_body_html("<p>Hi</p>")
            .add_inline_image(BinaryContent::inline_image(&b"png"[..], "image/png", "i"))
            .enable_auto_plain_from_html_with(|_: &str| "custom".to_string());
        let body = builder.build_body().unwrap();
        assert_eq!(body.children()[0].text(), Some("custom"));
    }

    #[test]
    fn test_explicit_plain_wins_over_converter() {
        let mut builder = MailBuilder::new();
        builder
            .set_body_plain("mine")
            .set_body_html("<p>Hi</p>")
            .add_inline_image(BinaryContent::inline_image(&b"png"[..], "image/png", "i"))
            .enable_auto_plain_from_html();
        let body = builder.build_body().unwrap();
        assert_eq!(body.children()[0].text(), Some("mine"));
    }
}
