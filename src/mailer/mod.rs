//! Fire-and-forget email dispatch.
//!
//! Lifecycle operations hand messages to a `Mailer`, which pushes them into
//! a bounded channel drained by a single background task. The task hands
//! each message to an `EmailSender`; a failed delivery is logged and never
//! retried, and a full queue drops the message instead of blocking the
//! request that produced it. Nothing in here can fail an operation whose
//! state change already committed.

pub mod templates;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Email delivery abstraction used by the dispatch task.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error to have it logged and dropped.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of delivering it.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

/// Sender that posts messages to an HTTP mail provider.
pub struct HttpEmailSender {
    client: Client,
    endpoint: String,
    token: Option<SecretString>,
}

impl HttpEmailSender {
    pub fn new(endpoint: String, token: Option<SecretString>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("failed to build mail http client")?;
        Ok(Self {
            client,
            endpoint,
            token,
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(&json!({
            "to": message.to,
            "subject": message.subject,
            "html": message.html_body,
        }));

        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .context("failed to reach mail provider")?;

        if !response.status().is_success() {
            bail!("mail provider returned {}", response.status());
        }

        Ok(())
    }
}

/// Handle used to enqueue messages without waiting on delivery.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::Sender<EmailMessage>,
}

impl Mailer {
    /// Enqueue a message. Never blocks; a full or closed queue drops the
    /// message with a log line.
    pub fn dispatch(&self, message: EmailMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(message)) => {
                warn!(to = %message.to, "email queue full, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(message)) => {
                error!(to = %message.to, "email dispatcher gone, dropping message");
            }
        }
    }
}

/// Spawn the background task that drains the queue.
pub fn spawn_dispatcher(
    sender: Arc<dyn EmailSender>,
    capacity: usize,
) -> (Mailer, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(capacity.max(1));

    let handle = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            // Best effort: log the failure and move on, never retry.
            if let Err(err) = sender.send(&message).await {
                error!(to = %message.to, "email delivery failed: {err:#}");
            }
        }
    });

    (Mailer { tx }, handle)
}
