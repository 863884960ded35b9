//! Error types for building and sending messages.

/// Result type alias for mailbuilder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from building or sending a message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The body could not be composed.
    #[error("Composition failed: {0}")]
    Composition(#[from] mailbuilder_mime::Error),

    /// The transport rejected or failed to deliver the message.
    #[error("Delivery failed: {0}")]
    Transport(#[from] mailbuilder_smtp::Error),

    /// No sender was set.
    #[error("Message has no sender")]
    NoSender,

    /// No `To`, `Cc`, or `Bcc` recipient was set.
    #[error("Message has no recipients")]
    NoRecipients,
}
