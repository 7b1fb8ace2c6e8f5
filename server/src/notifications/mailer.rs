use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("mail delivery rejected: {0}")]
    Rejected(String),
}

/// Delivers plain-text e-mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Writes messages to the log instead of sending them. Used when no SMTP
/// server is configured.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "E-mail (not sent, no SMTP server configured)"
        );
        tracing::debug!(body = %email.body, "E-mail body");
        Ok(())
    }
}

#[derive(Debug, Default)]
enum Refuse {
    #[default]
    Nobody,
    Everyone,
    Address(String),
}

/// Keeps every message in memory for inspection.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    refuse: Refuse,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            refuse: Refuse::Everyone,
        }
    }

    /// A mailer that bounces messages to `address` and records the rest.
    pub fn rejecting(address: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            refuse: Refuse::Address(address.into()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    /// Waits up to `timeout` for at least `count` messages, for callers that
    /// only dispatch in the background.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<OutgoingEmail> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let sent = self.sent();
            if sent.len() >= count || tokio::time::Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let refused = match &self.refuse {
            Refuse::Nobody => false,
            Refuse::Everyone => true,
            Refuse::Address(address) => *address == email.to,
        };
        if refused {
            return Err(MailError::Rejected(format!("refusing to send to {}", email.to)));
        }
        if let Ok(mut outbox) = self.sent.lock() {
            outbox.push(email);
        }
        Ok(())
    }
}
