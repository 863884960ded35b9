//! Core SMTP types.

mod address;
mod reply;

pub use address::{Address, Mailbox};
pub use reply::{Reply, ReplyCode, is_last_reply_line};
