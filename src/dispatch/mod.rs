//! Dispatch gateway: transmits approved replies.
//!
//! Called only from `ReviewBoard::approve`. Nothing else sends mail.

mod smtp;

pub use smtp::SmtpGateway;

use async_trait::async_trait;

use crate::error::DispatchError;

/// Outbound transport for approved replies.
#[async_trait]
pub trait DispatchGateway: Send + Sync {
    /// Gateway name, for logging.
    fn name(&self) -> &str;

    /// Send one message.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DispatchError>;
}

/// Gateway used when no transport is configured. Every send fails, so
/// approvals leave entries pending with a visible error.
pub struct DisabledGateway;

#[async_trait]
impl DispatchGateway for DisabledGateway {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), DispatchError> {
        Err(DispatchError::NotConfigured)
    }
}

/// Subject for a reply: `Re: <subject>` unless it already is one.
pub fn reply_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    let already_reply = trimmed
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"));
    if already_reply {
        trimmed.to_string()
    } else {
        format!("Re: {trimmed}")
    }
}
