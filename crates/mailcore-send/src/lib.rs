//! # mailcore-send
//!
//! The send-queue dispatcher: parses a queued-message file (§6.1 of the
//! queue format) into a [`queue::QueueInfo`] and drives it through the
//! SMTP and/or NNTP client, then applies post-send flag updates on the
//! originating folder store.
//!
//! Account resolution and local folder storage are external
//! collaborators — this crate depends only on `mailcore-smtp` and
//! `mailcore-nntp` for delivery, and on the narrow [`dispatch::FlagTarget`]
//! / [`dispatch::OutboxStore`] traits for everything else.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod dispatch;
mod error;
pub mod queue;

pub use dispatch::{
    FlagTarget, NntpTarget, OutboxStore, SmtpSecurity, SmtpTarget, queue_send_all,
    send_queued_message, send_queued_message_with_progress,
};
pub use error::{Error, Result};
pub use queue::QueueInfo;
