//! Sends an HTML message with an inline logo and optional attachments.
//!
//! ```text
//! cargo run --example send_mail -- smtp.toml you@example.com [FILE]...
//! ```
//!
//! `smtp.toml` holds the session settings plus the sender:
//!
//! ```toml
//! from = "Me <me@example.com>"
//!
//! [smtp]
//! host = "smtp.example.com"
//! security = "starttls"
//! username = "me@example.com"
//! password = "secret"
//! ```
//!
//! Set `DRY_RUN=1` to print the message instead of sending it.

use anyhow::{Context, bail};
use mailbuilder::{BinaryContent, MailBuilder, SmtpSession, SmtpTransport};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOGO: &[u8] = b"\x89PNG\r\n\x1a\n";

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

#[derive(Deserialize)]
struct Config {
    from: String,
    smtp: SmtpSession,
}

fn read_config(path: &str) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    toml::from_str(&raw).with_context(|| format!("parsing {path}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailbuilder=debug,mailbuilder_smtp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config), Some(to)) = (args.next(), args.next()) else {
        bail!("usage: send_mail <config.toml> <recipient> [FILE]...");
    };
    let Config { from, smtp: session } = read_config(&config)?;

    let mut builder = MailBuilder::new();
    builder
        .set_from(&from)
        .add_to(&to)
        .set_subject("Hello from mailbuilder")
        .set_body_html(
            "<html><body><h1>Hello</h1>\
             <p>This message was built with <b>mailbuilder</b>.</p>\
             <p><img src=\"cid:logo\"></p></body></html>",
        )
        .add_inline_image(BinaryContent::inline_image(LOGO, "image/png", "logo"))
        .enable_auto_plain_from_html();

    for file in args {
        let path = Path::new(&file);
        builder.add_attachment(BinaryContent::attachment_from_file(
            path,
            content_type_for(path),
        ));
    }

    if std::env::var_os("DRY_RUN").is_some() {
        let message = builder.build_message()?;
        print!("{}", String::from_utf8_lossy(&message.to_rfc5322()));
        return Ok(());
    }

    info!(host = %session.host, "Sending");
    let transport = SmtpTransport::new(session);
    builder.build_message_and_send(&transport).await?;
    info!("Done");
    Ok(())
}
