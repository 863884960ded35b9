//! Message delivery.

use crate::command::Command;
use crate::connection::{Capabilities, Dialogue, connect, upgrade_to_tls};
use crate::error::{Error, Result};
use crate::session::{Security, SmtpSession};
use crate::types::{Address, ReplyCode};
use std::future::Future;
use tokio::io::{AsyncRead, AsyncWrite};

/// SMTP envelope: who the message is from and who receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Reverse path (`MAIL FROM`).
    pub from: Address,
    /// Forward paths (`RCPT TO`), in order.
    pub recipients: Vec<Address>,
}

impl Envelope {
    /// Creates an envelope.
    #[must_use]
    pub const fn new(from: Address, recipients: Vec<Address>) -> Self {
        Self { from, recipients }
    }
}

/// Something that can deliver a rendered message.
pub trait Transport: Send + Sync {
    /// Delivers `message` (RFC 5322 bytes) to the envelope recipients.
    fn send(
        &self,
        envelope: &Envelope,
        message: &[u8],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Delivers messages to one SMTP server.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    session: SmtpSession,
}

impl SmtpTransport {
    /// Creates a transport for the given session.
    #[must_use]
    pub const fn new(session: SmtpSession) -> Self {
        Self { session }
    }

    /// Returns the session settings.
    #[must_use]
    pub const fn session(&self) -> &SmtpSession {
        &self.session
    }

    /// Runs a whole submission over an already connected stream.
    ///
    /// Reads the greeting, sends `EHLO`, authenticates when credentials are
    /// configured, and transfers the message. The stream is used as is, so
    /// any encryption must already be in place.
    ///
    /// # Errors
    ///
    /// Returns an error if any step is rejected or the server stalls.
    pub async fn send_over<S>(&self, stream: S, envelope: &Envelope, message: &[u8]) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut dialogue = Dialogue::new(stream, self.session.timeout());
        dialogue.greeting().await?;
        let capabilities = dialogue.ehlo(&self.session.hello_name).await?;
        self.transact(&mut dialogue, &capabilities, envelope, message)
            .await
    }

    /// Reads the greeting, sends `EHLO` and asks for `STARTTLS`.
    ///
    /// Returns the stream once the server answered `220`, ready for the TLS
    /// handshake. Nothing the server sent after that reply is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if `STARTTLS` is not advertised, or
    /// an error if the server refuses the upgrade.
    pub async fn negotiate_starttls<S>(&self, stream: S) -> Result<S>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut dialogue = Dialogue::new(stream, self.session.timeout());
        dialogue.greeting().await?;
        let capabilities = dialogue.ehlo(&self.session.hello_name).await?;
        if !capabilities.supports("STARTTLS") {
            return Err(Error::NotSupported("STARTTLS".into()));
        }
        dialogue
            .expect(&Command::StartTls, |code| code == ReplyCode::SERVICE_READY)
            .await?;
        Ok(dialogue.into_inner())
    }

    /// Continues on an upgraded stream: there is no new greeting, so the
    /// client starts over with `EHLO`.
    async fn resume_after_tls<S>(
        &self,
        stream: S,
        envelope: &Envelope,
        message: &[u8],
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut dialogue = Dialogue::new(stream, self.session.timeout());
        let capabilities = dialogue.ehlo(&self.session.hello_name).await?;
        self.transact(&mut dialogue, &capabilities, envelope, message)
            .await
    }

    async fn send_starttls(&self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let session = &self.session;
        let tcp = connect(&session.host, session.effective_port(), session.timeout()).await?;
        let tcp = self.negotiate_starttls(tcp).await?;
        let tls = upgrade_to_tls(&session.host, tcp).await?;
        self.resume_after_tls(tls, envelope, message).await
    }

    async fn transact<S>(
        &self,
        dialogue: &mut Dialogue<S>,
        capabilities: &Capabilities,
        envelope: &Envelope,
        message: &[u8],
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        if let Some((username, password)) = self.session.credentials() {
            if !capabilities.supports_auth("PLAIN") {
                return Err(Error::NotSupported("AUTH PLAIN".into()));
            }
            dialogue
                .expect(&Command::auth_plain(username, password), |code| {
                    code == ReplyCode::AUTH_SUCCESS
                })
                .await?;
        }

        let eight_bit = !message.is_ascii() && capabilities.supports("8BITMIME");
        dialogue
            .expect(
                &Command::MailFrom {
                    from: envelope.from.clone(),
                    eight_bit,
                },
                ReplyCode::is_success,
            )
            .await?;

        for to in &envelope.recipients {
            dialogue
                .expect(&Command::RcptTo { to: to.clone() }, ReplyCode::is_success)
                .await?;
        }

        dialogue
            .expect(&Command::Data, |code| code == ReplyCode::START_DATA)
            .await?;
        dialogue.send_data(message).await?;

        tracing::info!(
            server = %capabilities.hostname,
            recipients = envelope.recipients.len(),
            bytes = message.len(),
            "Message delivered"
        );

        // The message is accepted at this point; a failed QUIT only loses
        // the goodbye.
        if let Err(error) = dialogue
            .expect(&Command::Quit, |code| code == ReplyCode::CLOSING)
            .await
        {
            tracing::debug!(%error, "QUIT failed after delivery");
        }
        Ok(())
    }
}

impl Transport for SmtpTransport {
    async fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let session = &self.session;
        tracing::debug!(
            host = %session.host,
            port = session.effective_port(),
            security = ?session.security,
            "Connecting to SMTP server"
        );

        match session.security {
            Security::None => {
                let tcp =
                    connect(&session.host, session.effective_port(), session.timeout()).await?;
                self.send_over(tcp, envelope, message).await
            }
            Security::Tls => {
                let tcp =
                    connect(&session.host, session.effective_port(), session.timeout()).await?;
                let tls = upgrade_to_tls(&session.host, tcp).await?;
                self.send_over(tls, envelope, message).await
            }
            Security::StartTls => self.send_starttls(envelope, message).await,
        }
    }
}
