//! Integration tests for the SMTP dialogue.
//!
//! These tests use a mock stream to replay server replies without a real
//! server connection.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailbuilder_smtp::connection::upgrade_to_tls;
use mailbuilder_smtp::{Address, Envelope, Error, SmtpSession, SmtpTransport};

/// Mock stream that returns predefined replies.
#[derive(Debug)]
struct MockStream {
    /// Replies to return (in order).
    replies: Cursor<Vec<u8>>,
    /// Captured bytes sent by the client.
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(replies: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            replies: Cursor::new(replies.to_vec()),
            sent: Arc::clone(&sent),
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.replies.get_ref();
        let pos = usize::try_from(self.replies.position()).unwrap_or(usize::MAX);

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.replies.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("mailbuilder_smtp=trace")
        .with_test_writer()
        .try_init();
}

fn session(credentials: bool) -> SmtpSession {
    let mut session = SmtpSession::unauthenticated("mock.example.com", 25).timeout_secs(5);
    if credentials {
        session.username = Some("user".to_string());
        session.password = Some("pass".to_string());
    }
    session
}

fn envelope() -> Envelope {
    Envelope::new(
        Address::new("a@x.org").unwrap(),
        vec![Address::new("b@y.org").unwrap(), Address::new("c@y.org").unwrap()],
    )
}

fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(sent.lock().unwrap().clone()).unwrap()
}

const EHLO: &[u8] = b"250-mock.example.com greets localhost\r\n250-8BITMIME\r\n250 AUTH PLAIN LOGIN\r\n";

#[tokio::test]
async fn test_full_submission() {
    init_tracing();
    let mut replies = b"220 mock.example.com ESMTP\r\n".to_vec();
    replies.extend_from_slice(EHLO);
    replies.extend_from_slice(
        b"235 2.7.0 Authentication successful\r\n\
          250 2.1.0 Sender OK\r\n\
          250 2.1.5 Recipient OK\r\n\
          250 2.1.5 Recipient OK\r\n\
          354 Start mail input\r\n\
          250 2.0.0 Queued\r\n\
          221 2.0.0 Bye\r\n",
    );
    let (stream, sent) = MockStream::new(&replies);

    let transport = SmtpTransport::new(session(true));
    transport
        .send_over(stream, &envelope(), b"Subject: hi\n\n.dot\n")
        .await
        .unwrap();

    assert_eq!(
        sent_text(&sent),
        "EHLO localhost\r\n\
         AUTH PLAIN AHVzZXIAcGFzcw==\r\n\
         MAIL FROM:<a@x.org>\r\n\
         RCPT TO:<b@y.org>\r\n\
         RCPT TO:<c@y.org>\r\n\
         DATA\r\n\
         Subject: hi\r\n\r\n..dot\r\n.\r\n\
         QUIT\r\n"
    );
}

#[tokio::test]
async fn test_eight_bit_body_is_announced() {
    let mut replies = b"220 ready\r\n".to_vec();
    replies.extend_from_slice(EHLO);
    replies.extend_from_slice(b"250 ok\r\n250 ok\r\n250 ok\r\n354 go\r\n250 ok\r\n221 bye\r\n");
    let (stream, sent) = MockStream::new(&replies);

    let transport = SmtpTransport::new(session(false));
    transport
        .send_over(stream, &envelope(), "Subject: Grüße\r\n\r\nx".as_bytes())
        .await
        .unwrap();

    assert!(sent_text(&sent).contains("MAIL FROM:<a@x.org> BODY=8BITMIME\r\n"));
}

#[tokio::test]
async fn test_rejected_recipient() {
    init_tracing();
    let mut replies = b"220 ready\r\n".to_vec();
    replies.extend_from_slice(EHLO);
    replies.extend_from_slice(b"250 ok\r\n550 5.1.1 No such user\r\n");
    let (stream, sent) = MockStream::new(&replies);

    let transport = SmtpTransport::new(session(false));
    let err = transport
        .send_over(stream, &envelope(), b"x")
        .await
        .unwrap_err();

    assert!(err.is_permanent());
    assert!(matches!(err, Error::SmtpError { code: 550, .. }));
    assert!(!sent_text(&sent).contains("DATA"));
}

#[tokio::test]
async fn test_missing_auth_plain() {
    let replies = b"220 ready\r\n250-mock\r\n250 SIZE 1000\r\n";
    let (stream, _sent) = MockStream::new(replies);

    let transport = SmtpTransport::new(session(true));
    let err = transport
        .send_over(stream, &envelope(), b"x")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotSupported(_)));
}

#[tokio::test]
async fn test_refused_greeting() {
    let (stream, sent) = MockStream::new(b"554 No SMTP service here\r\n");

    let transport = SmtpTransport::new(session(false));
    let err = transport
        .send_over(stream, &envelope(), b"x")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SmtpError { code: 554, .. }));
    assert!(sent_text(&sent).is_empty());
}

#[tokio::test]
async fn test_server_hangs_up() {
    let (stream, _sent) = MockStream::new(b"220 ready\r\n");

    let transport = SmtpTransport::new(session(false));
    let err = transport
        .send_over(stream, &envelope(), b"x")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
}

const STARTTLS_EHLO: &[u8] = b"250-mock.example.com\r\n250-STARTTLS\r\n250 AUTH PLAIN\r\n";

#[tokio::test]
async fn test_starttls_negotiation_hands_over_the_stream() {
    init_tracing();
    let mut replies = b"220 ready\r\n".to_vec();
    replies.extend_from_slice(STARTTLS_EHLO);
    replies.extend_from_slice(b"220 2.0.0 Ready to start TLS\r\n");
    let (stream, sent) = MockStream::new(&replies);

    let transport = SmtpTransport::new(session(true));
    let stream = transport.negotiate_starttls(stream).await.unwrap();
    assert_eq!(sent_text(&sent), "EHLO localhost\r\nSTARTTLS\r\n");

    // The mock cannot answer the handshake, but the client hello must go
    // out on the same stream before anything else.
    let err = upgrade_to_tls("mock.example.com", stream).await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    let sent = sent.lock().unwrap();
    let handshake = &sent[b"EHLO localhost\r\nSTARTTLS\r\n".len()..];
    assert_eq!(handshake.first(), Some(&0x16));
}

#[tokio::test]
async fn test_starttls_not_advertised() {
    let mut replies = b"220 ready\r\n".to_vec();
    replies.extend_from_slice(EHLO);
    let (stream, sent) = MockStream::new(&replies);

    let transport = SmtpTransport::new(session(false));
    let err = transport.negotiate_starttls(stream).await.unwrap_err();

    assert!(matches!(err, Error::NotSupported(_)));
    assert!(!sent_text(&sent).contains("STARTTLS"));
}

#[tokio::test]
async fn test_starttls_refused() {
    let mut replies = b"220 ready\r\n".to_vec();
    replies.extend_from_slice(STARTTLS_EHLO);
    replies.extend_from_slice(b"454 4.7.0 TLS not available\r\n");
    let (stream, _sent) = MockStream::new(&replies);

    let transport = SmtpTransport::new(session(false));
    let err = transport.negotiate_starttls(stream).await.unwrap_err();

    assert!(err.is_transient());
    assert!(matches!(err, Error::SmtpError { code: 454, .. }));
}
