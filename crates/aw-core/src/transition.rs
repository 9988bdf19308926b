//! Classification of presence changes into session transitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::presence::Status;

/// Outcome of comparing two consecutive presence observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// The user became present.
    Started,
    /// The user went offline.
    Stopped,
    /// Nothing to account for.
    None,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::None => "none",
        };
        f.write_str(s)
    }
}

/// Classifies a presence change.
///
/// Without a previous observation the new status alone decides: present means
/// started, offline means stopped.
pub const fn classify(old: Option<Status>, new: Status) -> Transition {
    match (old, new.is_present()) {
        (None, true) => Transition::Started,
        (None, false) => Transition::Stopped,
        (Some(old), true) if !old.is_present() => Transition::Started,
        (Some(old), false) if old.is_present() => Transition::Stopped,
        (Some(_), _) => Transition::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_uses_new_status() {
        for status in [Status::Online, Status::Idle, Status::DoNotDisturb] {
            assert_eq!(classify(None, status), Transition::Started, "{status}");
        }
        assert_eq!(classify(None, Status::Offline), Transition::Stopped);
    }

    #[test]
    fn offline_to_present_starts() {
        assert_eq!(
            classify(Some(Status::Offline), Status::Online),
            Transition::Started
        );
        assert_eq!(
            classify(Some(Status::Offline), Status::DoNotDisturb),
            Transition::Started
        );
    }

    #[test]
    fn present_to_offline_stops() {
        assert_eq!(
            classify(Some(Status::Online), Status::Offline),
            Transition::Stopped
        );
        assert_eq!(
            classify(Some(Status::Idle), Status::Offline),
            Transition::Stopped
        );
    }

    #[test]
    fn same_class_is_none() {
        assert_eq!(
            classify(Some(Status::Online), Status::Idle),
            Transition::None
        );
        assert_eq!(
            classify(Some(Status::Offline), Status::Offline),
            Transition::None
        );
    }

    #[test]
    fn total_and_deterministic_over_domain() {
        let olds = std::iter::once(None).chain(Status::ALL.into_iter().map(Some));
        for old in olds {
            for new in Status::ALL {
                let first = classify(old, new);
                assert_eq!(first, classify(old, new), "{old:?} -> {new:?}");

                let expected = match old {
                    None if new.is_present() => Transition::Started,
                    None => Transition::Stopped,
                    Some(old) if old.is_present() == new.is_present() => Transition::None,
                    Some(_) if new.is_present() => Transition::Started,
                    Some(_) => Transition::Stopped,
                };
                assert_eq!(first, expected, "{old:?} -> {new:?}");
            }
        }
    }
}
