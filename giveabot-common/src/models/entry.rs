// File: giveabot-common/src/models/entry.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::contest::{Contest, ContestKind};

/// One participation record. At most one exists per
/// (contest_id, user_id); the storage layer enforces that with the
/// table's composite primary key, never with a pre-check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestEntry {
    pub contest_id: String,
    pub user_id: String,
    pub guild_id: String,
    /// Copied from the contest so cooldown queries stay category-scoped
    /// without a join.
    pub kind: ContestKind,
    pub entered_at: DateTime<Utc>,
    pub is_winner: bool,
    pub claimed: bool,
}

impl ContestEntry {
    /// A fresh giveaway entry for `user_id`.
    pub fn for_giveaway(contest: &Contest, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            contest_id: contest.contest_id.clone(),
            user_id: user_id.to_string(),
            guild_id: contest.guild_id.clone(),
            kind: contest.kind,
            entered_at: now,
            is_winner: false,
            claimed: false,
        }
    }

    /// A drop claim is recorded as an already-claimed entry; `claimed`
    /// in the durable store is what crash recovery trusts.
    pub fn for_claim(contest: &Contest, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            claimed: true,
            ..Self::for_giveaway(contest, user_id, now)
        }
    }
}
