// File: giveabot-core/src/services/contest_service.rs
//
// Owns the contest lifecycle: admission, claims, timer-driven
// expiration, winner selection, rerolls, and the moderation/config
// operations around them. All state transitions funnel through the
// store's check-and-set on `Contest.state`; the in-memory Active cache
// is bookkeeping, never the source of truth.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use giveabot_common::error::Error;
use giveabot_common::models::contest::{BonusRole, Contest, ContestKind, ContestState};
use giveabot_common::models::entry::ContestEntry;
use giveabot_common::models::guild_settings::{
    BlacklistedUser, CooldownRule, CreatorPermission, GuildSettings,
};
use giveabot_common::models::participant::{
    AdmitOutcome, ClaimOutcome, ContestStatus, DenialReason, EnterOutcome, ParticipantSnapshot,
};
use giveabot_common::traits::collaborators::{ContestNotifier, ParticipantDirectory};
use giveabot_common::traits::repository_traits::{
    ContestRepository, EntryRepository, GuildSettingsRepository,
};

use crate::services::claim_lock::ClaimLocks;
use crate::services::cooldown::CooldownGovernor;
use crate::services::eligibility::{self, Eligibility};
use crate::services::selection;
use crate::tasks::expiration;

/// What the Active cache keeps per contest: enough for fast admission
/// checks and timer bookkeeping, nothing that can go stale in a way
/// that matters.
#[derive(Debug, Clone)]
pub struct ActiveContest {
    pub guild_id: String,
    pub kind: ContestKind,
    pub ends_at: DateTime<Utc>,
}

/// Aggregate view for the stats command.
#[derive(Debug, Clone)]
pub struct GuildContestStats {
    pub total_contests: i64,
    pub active_contests: i64,
    pub top_participants: Vec<(String, i64)>,
    pub top_winners: Vec<(String, i64)>,
}

pub struct ContestService {
    pub(crate) contest_repo: Arc<dyn ContestRepository>,
    pub(crate) entry_repo: Arc<dyn EntryRepository>,
    settings_repo: Arc<dyn GuildSettingsRepository>,
    directory: Arc<dyn ParticipantDirectory>,
    notifier: Arc<dyn ContestNotifier>,
    cooldown: CooldownGovernor,
    claim_locks: ClaimLocks,
    active: DashMap<String, ActiveContest>,
}

impl ContestService {
    pub fn new(
        contest_repo: Arc<dyn ContestRepository>,
        entry_repo: Arc<dyn EntryRepository>,
        settings_repo: Arc<dyn GuildSettingsRepository>,
        directory: Arc<dyn ParticipantDirectory>,
        notifier: Arc<dyn ContestNotifier>,
    ) -> Self {
        let cooldown = CooldownGovernor::new(Arc::clone(&entry_repo));
        Self {
            contest_repo,
            entry_repo,
            settings_repo,
            directory,
            notifier,
            cooldown,
            claim_locks: ClaimLocks::new(),
            active: DashMap::new(),
        }
    }

    /// Startup recovery: every durably-Active contest is either ended on
    /// the spot (deadline already passed while we were down) or cached
    /// and re-armed for its remaining duration.
    pub async fn load_active_contests(self: &Arc<Self>) -> Result<(), Error> {
        let now = Utc::now();
        let contests = self.contest_repo.list_active().await?;
        info!("Loading {} active contests", contests.len());

        for contest in contests {
            if contest.is_expired(now) {
                self.run_end_of_contest(&contest.contest_id).await;
                continue;
            }
            self.cache_and_arm(&contest);
            info!(
                "Rescheduled contest {} to end at {}",
                contest.contest_id, contest.ends_at
            );
        }
        Ok(())
    }

    /// Validates and persists a new contest, then arms its expiration
    /// timer. The command layer supplies the id and the rules.
    pub async fn create_contest(self: &Arc<Self>, mut contest: Contest) -> Result<Contest, Error> {
        if contest.kind == ContestKind::Drop {
            contest.winner_count = 1;
        }
        contest.state = ContestState::Active;
        contest.winners.clear();
        contest.validate()?;

        self.contest_repo.create_contest(&contest).await?;
        self.cache_and_arm(&contest);
        info!(
            "Created {} '{}' in guild {} ending at {}",
            contest.kind.as_str(),
            contest.contest_id,
            contest.guild_id,
            contest.ends_at
        );
        Ok(contest)
    }

    fn cache_and_arm(self: &Arc<Self>, contest: &Contest) {
        self.active.insert(
            contest.contest_id.clone(),
            ActiveContest {
                guild_id: contest.guild_id.clone(),
                kind: contest.kind,
                ends_at: contest.ends_at,
            },
        );
        expiration::spawn_expiration_timer(
            Arc::clone(self),
            contest.contest_id.clone(),
            contest.ends_at,
        );
    }

    /// Giveaway admission: evaluator -> governor -> ledger. Expected
    /// outcomes come back as values; only store trouble is an Err.
    pub async fn enter(
        self: &Arc<Self>,
        contest_id: &str,
        snapshot: &ParticipantSnapshot,
    ) -> Result<EnterOutcome, Error> {
        let now = Utc::now();

        // Fast path off the Active cache for stragglers whose timer has
        // not fired yet; everything after this re-reads the store.
        let cached_expired = self
            .active
            .get(contest_id)
            .map(|c| now >= c.ends_at)
            .unwrap_or(false);
        if cached_expired {
            let svc = Arc::clone(self);
            let id = contest_id.to_string();
            tokio::spawn(async move { svc.run_end_of_contest(&id).await });
            return Ok(EnterOutcome::Denied(DenialReason::ContestEnded));
        }

        let contest = match self.contest_repo.get_contest(contest_id).await? {
            Some(c) => c,
            None => return Err(Error::NotFound(format!("contest '{contest_id}'"))),
        };

        if contest.kind != ContestKind::Giveaway {
            return Ok(EnterOutcome::Denied(DenialReason::WrongCategory));
        }

        // A late timer may not have fired yet; nudge the end procedure
        // and turn the straggler away.
        if contest.is_active() && contest.is_expired(now) {
            let svc = Arc::clone(self);
            let id = contest_id.to_string();
            tokio::spawn(async move { svc.run_end_of_contest(&id).await });
            return Ok(EnterOutcome::Denied(DenialReason::ContestEnded));
        }

        let settings = self.settings_repo.get_settings(&contest.guild_id).await?;
        match eligibility::evaluate(&contest, snapshot, settings.as_ref(), now) {
            Eligibility::Denied(reason) => return Ok(EnterOutcome::Denied(reason)),
            Eligibility::Allowed => {}
        }

        if !self
            .cooldown
            .check(
                &snapshot.user_id,
                &contest.guild_id,
                contest.kind,
                settings.as_ref(),
                now,
            )
            .await?
        {
            return Ok(EnterOutcome::Denied(DenialReason::OnCooldown));
        }

        let entry = ContestEntry::for_giveaway(&contest, &snapshot.user_id, now);
        match self.entry_repo.try_admit(&entry).await? {
            AdmitOutcome::Admitted => {
                debug!(
                    "Admitted user {} into giveaway {}",
                    snapshot.user_id, contest_id
                );
                Ok(EnterOutcome::Admitted)
            }
            AdmitOutcome::AlreadyEntered => Ok(EnterOutcome::AlreadyEntered),
        }
    }

    /// Drop claim: per-drop lock -> evaluator -> governor -> ledger ->
    /// state CAS. At most one caller ever gets past the CAS, and a
    /// claimed drop is terminal (Ended with a single winner).
    pub async fn claim(
        self: &Arc<Self>,
        drop_id: &str,
        snapshot: &ParticipantSnapshot,
    ) -> Result<ClaimOutcome, Error> {
        let _guard = match self.claim_locks.try_acquire(drop_id) {
            Some(g) => g,
            None => return Ok(ClaimOutcome::Busy),
        };

        let now = Utc::now();
        let contest = match self.contest_repo.get_contest(drop_id).await? {
            Some(c) => c,
            None => return Err(Error::NotFound(format!("drop '{drop_id}'"))),
        };

        if contest.kind != ContestKind::Drop {
            return Ok(ClaimOutcome::Denied(DenialReason::WrongCategory));
        }

        if !contest.is_active() {
            // Ended with a winner means somebody claimed it; ended empty
            // means it expired unclaimed.
            return if contest.winners.is_empty() {
                Ok(ClaimOutcome::Denied(DenialReason::ContestEnded))
            } else {
                Ok(ClaimOutcome::AlreadyClaimed)
            };
        }

        if contest.is_expired(now) {
            let svc = Arc::clone(self);
            let id = drop_id.to_string();
            tokio::spawn(async move { svc.run_end_of_contest(&id).await });
            return Ok(ClaimOutcome::Denied(DenialReason::ContestEnded));
        }

        let settings = self.settings_repo.get_settings(&contest.guild_id).await?;
        match eligibility::evaluate(&contest, snapshot, settings.as_ref(), now) {
            Eligibility::Denied(reason) => return Ok(ClaimOutcome::Denied(reason)),
            Eligibility::Allowed => {}
        }

        if !self
            .cooldown
            .check(
                &snapshot.user_id,
                &contest.guild_id,
                contest.kind,
                settings.as_ref(),
                now,
            )
            .await?
        {
            return Ok(ClaimOutcome::Denied(DenialReason::OnCooldown));
        }

        let entry = ContestEntry::for_claim(&contest, &snapshot.user_id, now);
        if self.entry_repo.try_admit(&entry).await? == AdmitOutcome::AlreadyEntered {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }

        // Linearization point: only one of claim / timer / early-end
        // flips the state row.
        if !self.contest_repo.try_mark_ended(drop_id).await? {
            // Lost to a concurrent end. The entry stays in the ledger as
            // audit history, like a giveaway straggler; the re-read says
            // how the winning end went.
            let winners = self
                .contest_repo
                .get_contest(drop_id)
                .await?
                .map(|c| c.winners)
                .unwrap_or_default();
            return if winners.iter().any(|w| w == &snapshot.user_id) {
                Ok(ClaimOutcome::Claimed)
            } else if winners.is_empty() {
                Ok(ClaimOutcome::Denied(DenialReason::ContestEnded))
            } else {
                Ok(ClaimOutcome::AlreadyClaimed)
            };
        }
        self.active.remove(drop_id);

        let winners = vec![snapshot.user_id.clone()];
        self.contest_repo.set_winners(drop_id, &winners).await?;
        self.entry_repo.mark_winners(drop_id, &winners).await?;
        info!("Drop {} claimed by {}", drop_id, snapshot.user_id);

        let mut ended = contest.clone();
        ended.state = ContestState::Ended;
        ended.winners = winners.clone();
        self.notify_winners(&ended, &winners).await;

        Ok(ClaimOutcome::Claimed)
    }

    /// Timer-safe wrapper: a failure to end one contest is logged and
    /// contained so it never blocks another contest's ending.
    pub async fn run_end_of_contest(self: &Arc<Self>, contest_id: &str) {
        if let Err(e) = self.end_contest(contest_id).await {
            error!("Error ending contest {}: {:?}", contest_id, e);
        }
    }

    /// End-of-contest procedure. Idempotent: the state CAS decides which
    /// of any racing triggers (timer fire, manual end, duplicate timer)
    /// actually runs the selection; losers return an empty winner list.
    pub async fn end_contest(self: &Arc<Self>, contest_id: &str) -> Result<Vec<String>, Error> {
        if !self.contest_repo.try_mark_ended(contest_id).await? {
            debug!("Contest {} already ended; end trigger is a no-op", contest_id);
            return Ok(Vec::new());
        }
        self.active.remove(contest_id);

        let contest = self
            .contest_repo
            .get_contest(contest_id)
            .await?
            .ok_or_else(|| {
                Error::Internal(format!(
                    "contest '{contest_id}' vanished after its state transition"
                ))
            })?;

        let entries = self.entry_repo.list_for_contest(contest_id).await?;
        let pool = self.weighted_pool(&contest, &entries).await?;

        let winners = {
            let mut rng = rand::rng();
            selection::select_winners(&pool, contest.winner_count as usize, &mut rng)
        };

        self.contest_repo.set_winners(contest_id, &winners).await?;
        if !winners.is_empty() {
            self.entry_repo.mark_winners(contest_id, &winners).await?;
        }
        info!(
            "Contest {} ended with {} entries and winners {:?}",
            contest_id,
            entries.len(),
            winners
        );

        let mut ended = contest;
        ended.state = ContestState::Ended;
        ended.winners = winners.clone();
        self.notify_winners(&ended, &winners).await;

        Ok(winners)
    }

    /// Manual early end: same procedure as the timer, just sooner. The
    /// armed timer later becomes a no-op through the CAS guard.
    pub async fn end_contest_early(self: &Arc<Self>, contest_id: &str) -> Result<Vec<String>, Error> {
        self.end_contest(contest_id).await
    }

    /// Draws fresh winners from the same entry pool. Valid only once the
    /// contest has ended; stored state is untouched beyond the audit
    /// trail, so repeated rerolls are independent.
    pub async fn reroll(
        self: &Arc<Self>,
        contest_id: &str,
        quota: Option<i32>,
    ) -> Result<Vec<String>, Error> {
        let contest = self
            .contest_repo
            .get_contest(contest_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("contest '{contest_id}'")))?;

        if contest.is_active() {
            return Err(Error::Parse(format!(
                "contest '{contest_id}' has not ended yet; cannot reroll"
            )));
        }

        let entries = self.entry_repo.list_for_contest(contest_id).await?;
        let pool = self.weighted_pool(&contest, &entries).await?;
        let quota = quota.unwrap_or(contest.winner_count).max(1) as usize;

        let winners = {
            let mut rng = rand::rng();
            selection::select_winners(&pool, quota, &mut rng)
        };
        info!("Rerolled contest {}: new winners {:?}", contest_id, winners);

        self.notify_winners(&contest, &winners).await;
        Ok(winners)
    }

    /// Resolves current snapshots for every entrant and weighs them by
    /// the contest's bonus roles. Participants who left the guild are
    /// skipped.
    async fn weighted_pool(
        &self,
        contest: &Contest,
        entries: &[ContestEntry],
    ) -> Result<Vec<(String, u32)>, Error> {
        let mut pool = Vec::with_capacity(entries.len());
        for entry in entries {
            let snap = self
                .directory
                .snapshot(&contest.guild_id, &entry.user_id)
                .await?;
            let Some(snap) = snap else {
                debug!(
                    "Skipping entrant {} for contest {}: no longer in guild",
                    entry.user_id, contest.contest_id
                );
                continue;
            };
            let weight = selection::weight_for(&snap, &contest.bonus_roles);
            pool.push((entry.user_id.clone(), weight));
        }
        Ok(pool)
    }

    /// Best-effort fan-out. A failed delivery to one winner never blocks
    /// the others and never rolls back selection.
    async fn notify_winners(&self, contest: &Contest, winners: &[String]) {
        if let Err(e) = self.notifier.contest_ended(contest, winners).await {
            warn!(
                "Could not announce end of contest {}: {}",
                contest.contest_id, e
            );
        }
        for winner in winners {
            if let Err(e) = self.notifier.deliver_prize(contest, winner).await {
                warn!(
                    "Could not deliver prize for contest {} to {}: {}",
                    contest.contest_id, winner, e
                );
            }
        }
    }

    pub async fn current_status(&self, contest_id: &str) -> Result<ContestStatus, Error> {
        let contest = self
            .contest_repo
            .get_contest(contest_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("contest '{contest_id}'")))?;
        let entry_count = self.entry_repo.count_for_contest(contest_id).await?;

        let now = Utc::now();
        let remaining = if contest.is_active() && !contest.is_expired(now) {
            Some(contest.ends_at - now)
        } else {
            None
        };

        Ok(ContestStatus {
            state: contest.state,
            entry_count,
            remaining,
        })
    }

    /// Rule edit while a contest is running (bonus multipliers, role
    /// blacklist). Rejected by the store once the contest has ended.
    pub async fn update_contest_roles(
        &self,
        contest_id: &str,
        bonus_roles: Vec<BonusRole>,
        blacklisted_roles: Vec<String>,
    ) -> Result<(), Error> {
        if bonus_roles.iter().any(|b| b.multiplier == 0) {
            return Err(Error::Parse("bonus multipliers must be positive".into()));
        }
        self.contest_repo
            .update_roles(contest_id, &bonus_roles, &blacklisted_roles)
            .await
    }

    /// Ordered entry listing for the audit command.
    pub async fn audit_entries(&self, contest_id: &str) -> Result<Vec<ContestEntry>, Error> {
        if self.contest_repo.get_contest(contest_id).await?.is_none() {
            return Err(Error::NotFound(format!("contest '{contest_id}'")));
        }
        self.entry_repo.list_for_contest(contest_id).await
    }

    pub async fn guild_stats(&self, guild_id: &str) -> Result<GuildContestStats, Error> {
        Ok(GuildContestStats {
            total_contests: self.contest_repo.count_for_guild(guild_id, false).await?,
            active_contests: self.contest_repo.count_for_guild(guild_id, true).await?,
            top_participants: self.entry_repo.top_participants(guild_id, 5).await?,
            top_winners: self.contest_repo.top_winners(guild_id, 5).await?,
        })
    }

    /// Whether `snapshot` may create contests of `kind` in this guild.
    pub async fn may_create(
        &self,
        guild_id: &str,
        kind: ContestKind,
        snapshot: &ParticipantSnapshot,
        has_manage_guild: bool,
    ) -> Result<bool, Error> {
        match self.settings_repo.get_settings(guild_id).await? {
            Some(s) => Ok(s.may_create(kind, snapshot, has_manage_guild)),
            None => Ok(true),
        }
    }

    async fn load_or_new_settings(&self, guild_id: &str) -> Result<GuildSettings, Error> {
        Ok(self
            .settings_repo
            .get_settings(guild_id)
            .await?
            .unwrap_or_else(|| GuildSettings::new(guild_id)))
    }

    /// Moderation: blacklist a user for the given categories and revoke
    /// their entries in every *active* contest of those categories.
    /// Ended contests keep their history.
    pub async fn blacklist_user(
        &self,
        guild_id: &str,
        user_id: &str,
        kinds: &[ContestKind],
        reason: Option<String>,
    ) -> Result<(), Error> {
        let mut settings = self.load_or_new_settings(guild_id).await?;
        for kind in kinds {
            let list = settings.blacklists.for_kind_mut(*kind);
            if !list.iter().any(|b| b.user_id == user_id) {
                list.push(BlacklistedUser {
                    user_id: user_id.to_string(),
                    reason: reason.clone(),
                });
            }
        }
        self.settings_repo.upsert_settings(&settings).await?;

        let mut revoked = 0u32;
        for contest in self.contest_repo.list_active_for_guild(guild_id).await? {
            if kinds.contains(&contest.kind)
                && self.entry_repo.revoke(&contest.contest_id, user_id).await?
            {
                revoked += 1;
            }
        }
        info!(
            "Blacklisted user {} in guild {} ({} active entries revoked)",
            user_id, guild_id, revoked
        );
        Ok(())
    }

    pub async fn unblacklist_user(
        &self,
        guild_id: &str,
        user_id: &str,
        kinds: &[ContestKind],
    ) -> Result<(), Error> {
        let mut settings = self.load_or_new_settings(guild_id).await?;
        for kind in kinds {
            settings
                .blacklists
                .for_kind_mut(*kind)
                .retain(|b| b.user_id != user_id);
        }
        self.settings_repo.upsert_settings(&settings).await
    }

    /// `rule = None` clears the category's cooldown.
    pub async fn set_cooldown(
        &self,
        guild_id: &str,
        kind: ContestKind,
        rule: Option<CooldownRule>,
    ) -> Result<(), Error> {
        if let Some(r) = &rule {
            if r.key_limit < 1 || r.window_seconds < 1 {
                return Err(Error::Parse(
                    "cooldown needs a positive key limit and window".into(),
                ));
            }
        }
        let mut settings = self.load_or_new_settings(guild_id).await?;
        settings.cooldowns.set_for_kind(kind, rule);
        self.settings_repo.upsert_settings(&settings).await
    }

    pub async fn set_creator_permission(
        &self,
        guild_id: &str,
        kind: ContestKind,
        rule: CreatorPermission,
    ) -> Result<(), Error> {
        let mut settings = self.load_or_new_settings(guild_id).await?;
        match kind {
            ContestKind::Giveaway => settings.giveaway_creation = rule,
            ContestKind::Drop => settings.drop_creation = rule,
        }
        self.settings_repo.upsert_settings(&settings).await
    }

    /// Cache contents, for status displays and tests.
    pub fn active_cache_snapshot(&self) -> Vec<(String, ActiveContest)> {
        self.active
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn is_cached_active(&self, contest_id: &str) -> bool {
        self.active.contains_key(contest_id)
    }
}
