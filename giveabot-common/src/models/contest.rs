// File: giveabot-common/src/models/contest.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Which flavor of contest this is. Giveaways collect entries for the
/// whole run and draw winners at expiry; drops are first-come
/// single-claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestKind {
    Giveaway,
    Drop,
}

impl ContestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContestKind::Giveaway => "giveaway",
            ContestKind::Drop => "drop",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "giveaway" => Ok(ContestKind::Giveaway),
            "drop" => Ok(ContestKind::Drop),
            other => Err(Error::Parse(format!("unknown contest kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestState {
    Active,
    Ended,
}

impl ContestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContestState::Active => "active",
            ContestState::Ended => "ended",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "active" => Ok(ContestState::Active),
            "ended" => Ok(ContestState::Ended),
            other => Err(Error::Parse(format!("unknown contest state '{other}'"))),
        }
    }
}

/// Extra-entry multiplier attached to a role. A participant holding
/// several bonus roles gets the product of the multipliers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRole {
    pub role_id: String,
    pub multiplier: u32,
}

/// A giveaway or drop. `contest_id` is opaque and stable once created;
/// the command layer normally hands us the announcement message id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contest {
    pub contest_id: String,
    pub guild_id: String,
    /// Opaque location token for the notifier collaborator.
    pub channel_id: String,
    pub kind: ContestKind,
    pub prize: String,
    pub platform: Option<String>,
    /// The prize payload (e.g. a game key), delivered to winners only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    pub winner_count: i32,
    pub hosted_by: Option<String>,
    pub required_role: Option<String>,
    pub boost_required: bool,
    pub blacklisted_roles: Vec<String>,
    pub bonus_roles: Vec<BonusRole>,
    pub state: ContestState,
    /// Ordered, empty while Active. At most one member for drops.
    pub winners: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Contest {
    pub fn is_active(&self) -> bool {
        self.state == ContestState::Active
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }

    /// Checks the structural invariants a contest must satisfy before it
    /// is persisted. Drops are clamped to a single winner by the service,
    /// so a drop arriving here with another quota is a caller bug.
    pub fn validate(&self) -> Result<(), Error> {
        if self.ends_at <= self.created_at {
            return Err(Error::Parse(format!(
                "contest '{}' must end after it begins",
                self.contest_id
            )));
        }
        if self.winner_count < 1 {
            return Err(Error::Parse(format!(
                "contest '{}' needs a winner quota of at least 1",
                self.contest_id
            )));
        }
        if self.kind == ContestKind::Drop && self.winner_count != 1 {
            return Err(Error::Parse(format!(
                "drop '{}' cannot have more than one winner",
                self.contest_id
            )));
        }
        if self.bonus_roles.iter().any(|b| b.multiplier == 0) {
            return Err(Error::Parse(format!(
                "contest '{}' has a zero bonus multiplier",
                self.contest_id
            )));
        }
        Ok(())
    }
}

/// Fallback contest id for callers that have no transport-provided id
/// (the original bot used the Discord message/interaction id).
pub fn new_contest_id() -> String {
    Uuid::new_v4().to_string()
}
