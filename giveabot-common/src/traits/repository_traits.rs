// File: giveabot-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::models::contest::{BonusRole, Contest, ContestKind};
use crate::models::entry::ContestEntry;
use crate::models::guild_settings::GuildSettings;
use crate::models::participant::AdmitOutcome;

#[async_trait]
pub trait ContestRepository: Send + Sync {
    async fn create_contest(&self, contest: &Contest) -> Result<(), Error>;
    async fn get_contest(&self, contest_id: &str) -> Result<Option<Contest>, Error>;

    /// Every contest still marked Active, for startup recovery.
    async fn list_active(&self) -> Result<Vec<Contest>, Error>;
    async fn list_active_for_guild(&self, guild_id: &str) -> Result<Vec<Contest>, Error>;

    /// Check-and-set Active -> Ended. Returns false when the contest was
    /// already Ended (or does not exist); this is the linearization point
    /// for every end-of-contest race.
    async fn try_mark_ended(&self, contest_id: &str) -> Result<bool, Error>;

    /// Records the winner list chosen at end-of-contest. Rerolls do not
    /// go through here; their winners are notification-only.
    async fn set_winners(&self, contest_id: &str, winners: &[String]) -> Result<(), Error>;

    /// Rule edits allowed only while the contest is Active.
    async fn update_roles(
        &self,
        contest_id: &str,
        bonus_roles: &[BonusRole],
        blacklisted_roles: &[String],
    ) -> Result<(), Error>;

    async fn count_for_guild(&self, guild_id: &str, active_only: bool) -> Result<i64, Error>;

    /// (user_id, wins) pairs, most wins first.
    async fn top_winners(&self, guild_id: &str, limit: i64) -> Result<Vec<(String, i64)>, Error>;
}

#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Atomic insert-or-fail on the (contest_id, user_id) key. A loser of
    /// a concurrent race observes `AlreadyEntered`, never an error.
    async fn try_admit(&self, entry: &ContestEntry) -> Result<AdmitOutcome, Error>;

    async fn count_for_contest(&self, contest_id: &str) -> Result<i64, Error>;

    /// All entries for a contest, entered_at ascending. This is also the
    /// audit view.
    async fn list_for_contest(&self, contest_id: &str) -> Result<Vec<ContestEntry>, Error>;

    async fn mark_winners(&self, contest_id: &str, user_ids: &[String]) -> Result<(), Error>;

    /// Moderation-triggered removal; returns whether a row was removed.
    async fn revoke(&self, contest_id: &str, user_id: &str) -> Result<bool, Error>;

    /// Entries that consume cooldown budget: wins or claims for this
    /// user/guild/category since `since`.
    async fn count_recent_awards(
        &self,
        user_id: &str,
        guild_id: &str,
        kind: ContestKind,
        since: DateTime<Utc>,
    ) -> Result<i64, Error>;

    /// (user_id, entry count) pairs, most entries first.
    async fn top_participants(
        &self,
        guild_id: &str,
        limit: i64,
    ) -> Result<Vec<(String, i64)>, Error>;
}

#[async_trait]
pub trait GuildSettingsRepository: Send + Sync {
    async fn get_settings(&self, guild_id: &str) -> Result<Option<GuildSettings>, Error>;
    async fn upsert_settings(&self, settings: &GuildSettings) -> Result<(), Error>;
}
