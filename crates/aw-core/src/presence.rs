//! Presence observations as delivered by the gateway feed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Visible status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Online,
    Idle,
    #[serde(rename = "dnd", alias = "do_not_disturb")]
    DoNotDisturb,
    /// Invisible accounts are reported to others as offline.
    #[serde(alias = "invisible")]
    Offline,
}

impl Status {
    /// All statuses, in gateway order.
    pub const ALL: [Self; 4] = [Self::Online, Self::Idle, Self::DoNotDisturb, Self::Offline];

    /// Whether the status counts as present (online, idle or do-not-disturb).
    #[must_use]
    pub const fn is_present(self) -> bool {
        !matches!(self, Self::Offline)
    }

    /// String representation used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::DoNotDisturb => "dnd",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single presence snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub visible_status: Status,
}

/// A presence change for one user.
///
/// `old_presence` is `None` when the previous presence is unknown, e.g. the
/// first observation since the process started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub user_id: UserId,
    #[serde(default)]
    pub old_presence: Option<Presence>,
    pub presence: Presence,
}

impl PresenceUpdate {
    /// Previous visible status, if known.
    pub fn old_status(&self) -> Option<Status> {
        self.old_presence.map(|presence| presence.visible_status)
    }

    /// Current visible status.
    pub const fn new_status(&self) -> Status {
        self.presence.visible_status
    }
}

/// Events consumed by the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// One-shot lifecycle event once the gateway session is established.
    Ready,
    PresenceUpdate(PresenceUpdate),
}
