//! Core domain logic for the presence watcher.
//!
//! This crate contains the fundamental types and logic for:
//! - Presence: gateway statuses and presence-update events
//! - Transitions: deciding whether a presence change starts or stops a session
//! - Sessions: the online/offline accrual arithmetic applied to session rows

pub mod presence;
pub mod session;
pub mod transition;
pub mod types;

pub use presence::{GatewayEvent, Presence, PresenceUpdate, Status};
pub use session::{Accrual, AccrualBasis, SessionRecord, offline_accrual, online_accrual};
pub use transition::{Transition, classify};
pub use types::{ChannelId, UserId, ValidationError};
