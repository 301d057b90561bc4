// File: giveabot-common/src/models/participant.rs

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::contest::ContestState;

/// What the eligibility checks see of a participant: captured by the
/// caller at admission time, or fetched through the ParticipantDirectory
/// at selection time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub user_id: String,
    pub guild_id: String,
    pub role_ids: Vec<String>,
    pub is_booster: bool,
}

impl ParticipantSnapshot {
    pub fn holds_role(&self, role_id: &str) -> bool {
        self.role_ids.iter().any(|r| r == role_id)
    }
}

/// Why an entry or claim was turned down. Ordering of the variants
/// mirrors the evaluator's fixed check order so denial messages stay
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    ContestEnded,
    Blacklisted { reason: Option<String> },
    MissingRequiredRole,
    BoosterOnly,
    BlacklistedRole,
    OnCooldown,
    WrongCategory,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::ContestEnded => write!(f, "This contest has ended"),
            DenialReason::Blacklisted { reason: Some(r) } => {
                write!(f, "You are blacklisted from this contest: {r}")
            }
            DenialReason::Blacklisted { reason: None } => {
                write!(f, "You are blacklisted from this contest")
            }
            DenialReason::MissingRequiredRole => {
                write!(f, "You do not have the required role to enter")
            }
            DenialReason::BoosterOnly => write!(f, "This contest is for server boosters only"),
            DenialReason::BlacklistedRole => {
                write!(f, "You have a role that is blacklisted from entering")
            }
            DenialReason::OnCooldown => {
                write!(f, "You have reached your prize limit for this time period")
            }
            DenialReason::WrongCategory => write!(f, "This contest cannot be entered that way"),
        }
    }
}

/// What the entry ledger reports for a single admission attempt.
/// `AlreadyEntered` is an expected outcome of racing requests or
/// double-submission, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    Admitted,
    AlreadyEntered,
}

/// Outcome of `enter` on a giveaway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterOutcome {
    Admitted,
    AlreadyEntered,
    Denied(DenialReason),
}

/// Outcome of `claim` on a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller claimed the drop; the notifier has been handed the
    /// secret payload.
    Claimed,
    AlreadyClaimed,
    /// Another claim holds the per-drop lock right now.
    Busy,
    Denied(DenialReason),
}

/// Snapshot for the presentation layer's status line.
#[derive(Debug, Clone)]
pub struct ContestStatus {
    pub state: ContestState,
    pub entry_count: i64,
    /// None once the contest has ended or the deadline has passed.
    pub remaining: Option<Duration>,
}
