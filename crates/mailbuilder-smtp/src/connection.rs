//! SMTP connection handling.
//!
//! [`Dialogue`] runs the command/reply exchange over any async byte
//! stream, so the same code drives TCP, TLS, and in-memory test streams.

use crate::command::{Command, encode_data};
use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode, is_last_reply_line};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

/// Server capabilities from the `EHLO` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Server hostname from the first reply line.
    pub hostname: String,
    keywords: Vec<String>,
}

impl Capabilities {
    /// Builds capabilities from an `EHLO` reply.
    #[must_use]
    pub fn from_reply(reply: &Reply) -> Self {
        let mut lines = reply.message.iter();
        let hostname = lines
            .next()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        let keywords = lines.map(|line| line.trim().to_uppercase()).collect();
        Self { hostname, keywords }
    }

    /// Checks whether an extension keyword was advertised.
    #[must_use]
    pub fn supports(&self, keyword: &str) -> bool {
        self.keywords
            .iter()
            .any(|line| line.split_whitespace().next() == Some(keyword))
    }

    /// Checks whether `AUTH` lists the given mechanism.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.keywords.iter().any(|line| {
            let mut words = line.split_whitespace();
            words.next() == Some("AUTH") && words.any(|m| m == mechanism)
        })
    }
}

/// Command/reply exchange over a stream.
#[derive(Debug)]
pub struct Dialogue<S> {
    reader: BufReader<S>,
    timeout: Duration,
}

impl<S> Dialogue<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream. Each reply must arrive within `timeout`.
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            reader: BufReader::new(stream),
            timeout,
        }
    }

    /// Returns the stream, dropping any buffered input.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }

    /// Reads the greeting and checks it is a 220.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses the session.
    pub async fn greeting(&mut self) -> Result<Reply> {
        let reply = self.read_reply().await?;
        check(&reply, |code| code == ReplyCode::SERVICE_READY)?;
        Ok(reply)
    }

    /// Sends `EHLO` and returns the advertised capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the greeting.
    pub async fn ehlo(&mut self, hostname: &str) -> Result<Capabilities> {
        let cmd = Command::Ehlo {
            hostname: hostname.to_string(),
        };
        let reply = self.command(&cmd).await?;
        check(&reply, ReplyCode::is_success)?;
        Ok(Capabilities::from_reply(&reply))
    }

    /// Sends a command and checks the reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SmtpError`] if the reply does not satisfy `accept`.
    pub async fn expect(
        &mut self,
        cmd: &Command,
        accept: impl Fn(ReplyCode) -> bool,
    ) -> Result<Reply> {
        let reply = self.command(cmd).await?;
        check(&reply, accept)?;
        Ok(reply)
    }

    /// Sends a command and reads its reply.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or reading fails.
    pub async fn command(&mut self, cmd: &Command) -> Result<Reply> {
        tracing::trace!(command = cmd.verb(), "Sending SMTP command");
        self.write_all(&cmd.serialize()).await?;
        self.read_reply().await
    }

    /// Sends the message content after a `354` and reads the final reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the message.
    pub async fn send_data(&mut self, message: &[u8]) -> Result<Reply> {
        self.write_all(&encode_data(message)).await?;
        let reply = self.read_reply().await?;
        check(&reply, ReplyCode::is_success)?;
        Ok(reply)
    }

    /// Reads one (possibly multi-line) reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the reply is late, or a protocol
    /// error if the connection closes or the reply is malformed.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let read = tokio::time::timeout(self.timeout, self.reader.read_line(&mut line))
                .await
                .map_err(|_| Error::Timeout(self.timeout))??;
            if read == 0 {
                return Err(Error::Protocol("Connection closed by server".into()));
            }

            let line = line.trim_end().to_string();
            if line.is_empty() {
                continue;
            }

            let is_last = is_last_reply_line(&line);
            lines.push(line);
            if is_last {
                break;
            }
        }

        let reply = Reply::parse(&lines)?;
        tracing::trace!(code = reply.code.as_u16(), "Received SMTP reply");
        Ok(reply)
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let timeout = self.timeout;
        let stream = self.reader.get_mut();
        tokio::time::timeout(timeout, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::Timeout(timeout))??;
        Ok(())
    }
}

fn check(reply: &Reply, accept: impl Fn(ReplyCode) -> bool) -> Result<()> {
    if accept(reply.code) {
        Ok(())
    } else {
        Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()))
    }
}

/// Opens a TCP connection, bounded by `timeout`.
///
/// # Errors
///
/// Returns an error if the connection fails or times out.
pub async fn connect(hostname: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addr = format!("{hostname}:{port}");
    let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::Timeout(timeout))??;
    Ok(stream)
}

/// Runs the TLS handshake on a connected stream.
///
/// # Errors
///
/// Returns an error if the hostname is invalid or the handshake fails.
pub async fn upgrade_to_tls<S>(hostname: &str, stream: S) -> Result<TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;
    Ok(create_tls_connector()
        .connect(server_name, stream)
        .await?)
}

/// Creates a TLS connector trusting the webpki roots.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
