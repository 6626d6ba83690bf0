//! SMTP gateway via lettre.

use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as Email, Tokio1Executor};
use secrecy::ExposeSecret;

use crate::config::SmtpConfig;
use crate::error::DispatchError;

use super::DispatchGateway;

/// Port that speaks TLS from the first byte instead of upgrading via STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends replies through an SMTP relay on the tokio executor.
///
/// Dropping the send future closes the connection, so an outer timeout
/// really abandons the send.
pub struct SmtpGateway {
    config: SmtpConfig,
    timeout: Duration,
}

impl SmtpGateway {
    /// `timeout` bounds each SMTP connect and command.
    pub fn new(config: SmtpConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DispatchError> {
        let host = &self.config.smtp_host;
        let builder = if self.config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| DispatchError::Transport(format!("SMTP relay error: {e}")))?;

        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().to_string(),
        );
        Ok(builder
            .port(self.config.smtp_port)
            .credentials(creds)
            .timeout(Some(self.timeout))
            .build())
    }

    /// Build the outgoing email. Split out so address validation is testable
    /// without a server.
    fn build_email(&self, to: &str, subject: &str, body: &str) -> Result<Email, DispatchError> {
        Email::builder()
            .from(self.config.from_address.parse().map_err(|e| {
                DispatchError::InvalidAddress {
                    address: self.config.from_address.clone(),
                    reason: format!("{e}"),
                }
            })?)
            .to(to.parse().map_err(|e| DispatchError::InvalidAddress {
                address: to.to_string(),
                reason: format!("{e}"),
            })?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| DispatchError::Build(e.to_string()))
    }
}

#[async_trait]
impl DispatchGateway for SmtpGateway {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DispatchError> {
        let email = self.build_email(to, subject, body)?;
        let mailer = self.transport()?;

        mailer
            .send(email)
            .await
            .map_err(|e| DispatchError::Transport(format!("SMTP send failed: {e}")))?;

        tracing::info!(to = %to, "Reply sent");
        Ok(())
    }
}
