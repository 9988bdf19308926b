//! Notification delivery for the presence watcher.
//!
//! Notifications are plain text lines sent to one pre-configured channel:
//! - [`DiscordNotifier`] posts them as channel messages over the REST API
//! - [`StdoutNotifier`] prints them, for running without a bot token

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use aw_core::ChannelId;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DISCORD_API_URL: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = concat!(
    "DiscordBot (amor-watcher, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The provided bot token was invalid.
    #[error("invalid bot token: {reason}")]
    InvalidToken { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Writing a notification locally failed.
    #[error("failed to write notification: {0}")]
    Io(#[from] std::io::Error),
}

/// Sink for transition notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification to the configured channel.
    async fn send_notification(&self, text: &str) -> Result<(), NotifyError>;
}

/// Posts notifications as messages in a Discord channel.
///
/// # Thread Safety
///
/// The notifier is safe to clone and share across tasks. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: reqwest::Client,
    token: String,
    channel_id: ChannelId,
}

impl fmt::Debug for DiscordNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordNotifier")
            .field("token", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .finish_non_exhaustive()
    }
}

impl DiscordNotifier {
    /// Creates a notifier for `channel_id` authenticated with a bot token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(token: impl Into<String>, channel_id: ChannelId) -> Result<Self, NotifyError> {
        let token = token.into();

        if token.is_empty() {
            return Err(NotifyError::InvalidToken {
                reason: "token cannot be empty",
            });
        }
        if token.trim().is_empty() {
            return Err(NotifyError::InvalidToken {
                reason: "token cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(NotifyError::ClientBuild)?;

        Ok(Self {
            http,
            token,
            channel_id,
        })
    }

    fn messages_url(&self) -> String {
        format!("{DISCORD_API_URL}/channels/{}/messages", self.channel_id)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_notification(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.messages_url())
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(&MessageRequest { content: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(parse_api_error(&body).unwrap_or_else(|| NotifyError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        tracing::debug!(channel_id = %self.channel_id, "notification delivered");
        Ok(())
    }
}

/// Prints each notification as one line on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send_notification(&self, text: &str) -> Result<(), NotifyError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("{text}\n").as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    content: &'a str,
}

fn parse_api_error(body: &str) -> Option<NotifyError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
        #[serde(default)]
        code: Option<u64>,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| NotifyError::Api {
            message: match payload.code {
                Some(code) => format!("{} (code {code})", payload.message),
                None => payload.message,
            },
        })
}
