//! Presence watcher: turns gateway events for one user into session accounting
//! and channel notifications.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::mpsc;

use aw_core::{Accrual, GatewayEvent, PresenceUpdate, Transition, UserId, classify};
use aw_notify::Notifier;

use crate::store::SessionStore;

/// Posted when the watched user comes online.
pub const STARTED_MESSAGE: &str = "🟢  Amor is now running";
/// Posted when the watched user goes offline.
pub const STOPPED_MESSAGE: &str = "🔴  Amor stopped";

/// What handling a single event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The gateway session is ready.
    Ready,
    /// The event was for a different user.
    Ignored,
    /// The watched user changed presence without starting or stopping.
    Unchanged,
    /// A transition was persisted and announced.
    Recorded {
        transition: Transition,
        accrual: Accrual,
    },
}

/// Counters reported when the event loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub events: usize,
    pub recorded: usize,
    pub failed: usize,
}

/// Watches one user's presence.
pub struct Watcher {
    store: SessionStore,
    notifier: Arc<dyn Notifier>,
    watched_user: UserId,
}

impl Watcher {
    pub fn new(store: SessionStore, notifier: Arc<dyn Notifier>, watched_user: UserId) -> Self {
        Self {
            store,
            notifier,
            watched_user,
        }
    }

    /// Consumes events until every sender is dropped.
    ///
    /// Events are handled one at a time. A failed event is logged and dropped;
    /// the loop carries on with the next one.
    pub async fn run(&self, mut events: mpsc::Receiver<GatewayEvent>) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Some(event) = events.recv().await {
            summary.events += 1;
            match self.handle(&event).await {
                Ok(Outcome::Recorded { .. }) => summary.recorded += 1,
                Ok(_) => {}
                Err(err) => {
                    summary.failed += 1;
                    tracing::error!(error = %format!("{err:#}"), "dropped presence event");
                }
            }
        }
        summary
    }

    /// Handles one event at the current time.
    pub async fn handle(&self, event: &GatewayEvent) -> Result<Outcome> {
        self.handle_at(event, Utc::now().trunc_subsecs(3)).await
    }

    /// Handles one event as if it arrived at `now`.
    pub async fn handle_at(&self, event: &GatewayEvent, now: DateTime<Utc>) -> Result<Outcome> {
        match event {
            GatewayEvent::Ready => {
                tracing::info!(watched_user = %self.watched_user, "watcher ready");
                Ok(Outcome::Ready)
            }
            GatewayEvent::PresenceUpdate(update) => self.handle_presence(update, now).await,
        }
    }

    async fn handle_presence(&self, update: &PresenceUpdate, now: DateTime<Utc>) -> Result<Outcome> {
        if update.user_id != self.watched_user {
            return Ok(Outcome::Ignored);
        }

        let transition = classify(update.old_status(), update.new_status());
        let (accrual, message) = match transition {
            Transition::Started => (
                self.store
                    .record_started(now)
                    .await
                    .context("failed to record session start")?,
                STARTED_MESSAGE,
            ),
            Transition::Stopped => (
                self.store
                    .record_stopped(now)
                    .await
                    .context("failed to record session stop")?,
                STOPPED_MESSAGE,
            ),
            Transition::None => {
                tracing::debug!(
                    old = ?update.old_status(),
                    new = %update.new_status(),
                    "presence changed without transition"
                );
                return Ok(Outcome::Unchanged);
            }
        };

        tracing::info!(
            %transition,
            accrued_ms = accrual.duration.num_milliseconds(),
            basis = ?accrual.basis,
            "recorded transition"
        );
        self.notifier
            .send_notification(message)
            .await
            .with_context(|| format!("failed to send {transition} notification"))?;

        Ok(Outcome::Recorded {
            transition,
            accrual,
        })
    }
}
