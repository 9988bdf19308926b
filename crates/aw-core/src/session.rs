//! Session records and the online/offline accrual arithmetic.
//!
//! A session row is opened when the watched user starts (a new row carrying the
//! offline time accrued since the previous session closed) and closed when the
//! user stops (the same row gains the online time accrued since it opened).

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// One row of cumulative accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Monotonic ordering key; the latest session has the largest id.
    pub id: i64,
    /// When the row was inserted.
    pub starts: DateTime<Utc>,
    /// When the user last became present within this session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined: Option<DateTime<Utc>>,
    /// When the user last went offline within this session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave: Option<DateTime<Utc>>,
    /// Accumulated online time. Absent means zero.
    #[serde(default, with = "millis_opt", skip_serializing_if = "Option::is_none")]
    pub online_time: Option<TimeDelta>,
    /// Accumulated offline time. Absent means zero.
    #[serde(default, with = "millis_opt", skip_serializing_if = "Option::is_none")]
    pub offline_time: Option<TimeDelta>,
}

/// How an accrued duration was derived from the previous row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualBasis {
    /// No previous row existed.
    Bootstrap,
    /// `now - leave`, plus any carried offline time.
    SinceLeave,
    /// `now - joined`, plus any carried online time.
    SinceJoined,
    /// The previous row has no `leave` but carries offline time: the absolute
    /// instant `now` (as an offset from the Unix epoch) plus that duration.
    EpochPlusCarried,
    /// The previous row has neither `leave` nor offline time: the absolute
    /// instant `now` as an offset from the Unix epoch.
    Epoch,
    /// The previous row has no `joined`: zero span plus any carried online time.
    MissingJoined,
}

impl AccrualBasis {
    /// Whether this basis mixes an absolute instant into a duration or lacks
    /// the timestamp the arithmetic needs.
    #[must_use]
    pub const fn is_degenerate(self) -> bool {
        matches!(
            self,
            Self::EpochPlusCarried | Self::Epoch | Self::MissingJoined
        )
    }
}

/// A computed duration ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    pub duration: TimeDelta,
    pub basis: AccrualBasis,
}

/// Offline time to store on the session opened at `now`.
pub fn offline_accrual(last: Option<&SessionRecord>, now: DateTime<Utc>) -> Accrual {
    let Some(last) = last else {
        return Accrual {
            duration: TimeDelta::zero(),
            basis: AccrualBasis::Bootstrap,
        };
    };

    let carried = last.offline_time.unwrap_or_default();
    if let Some(leave) = last.leave {
        return Accrual {
            duration: (now - leave) + carried,
            basis: AccrualBasis::SinceLeave,
        };
    }

    let since_epoch = now - DateTime::<Utc>::UNIX_EPOCH;
    match last.offline_time {
        Some(offline) => Accrual {
            duration: since_epoch + offline,
            basis: AccrualBasis::EpochPlusCarried,
        },
        None => Accrual {
            duration: since_epoch,
            basis: AccrualBasis::Epoch,
        },
    }
}

/// Online time to store when the latest session closes at `now`.
///
/// A row without `joined` has no span to measure; it keeps its carried online
/// time unchanged instead of failing.
pub fn online_accrual(last: Option<&SessionRecord>, now: DateTime<Utc>) -> Accrual {
    let Some(last) = last else {
        return Accrual {
            duration: TimeDelta::zero(),
            basis: AccrualBasis::Bootstrap,
        };
    };

    let carried = last.online_time.unwrap_or_default();
    match last.joined {
        Some(joined) => Accrual {
            duration: (now - joined) + carried,
            basis: AccrualBasis::SinceJoined,
        },
        None => Accrual {
            duration: carried,
            basis: AccrualBasis::MissingJoined,
        },
    }
}

mod millis_opt {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option, reason = "serde `with` passes the field by reference")]
    pub fn serialize<S: Serializer>(value: &Option<TimeDelta>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(delta) => s.serialize_some(&delta.num_milliseconds()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TimeDelta>, D::Error> {
        Option::<i64>::deserialize(d)?
            .map(|ms| {
                TimeDelta::try_milliseconds(ms)
                    .ok_or_else(|| serde::de::Error::custom(format!("duration out of range: {ms}")))
            })
            .transpose()
    }
}
