// File: giveabot-core/src/test_utils/memory.rs
//
// In-memory repository and collaborator implementations. They honor the
// same contracts as the Postgres layer (atomic insert-or-fail on the
// entry key, check-and-set on contest state) so service-level tests can
// exercise concurrency without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use giveabot_common::error::Error;
use giveabot_common::models::contest::{BonusRole, Contest, ContestKind, ContestState};
use giveabot_common::models::entry::ContestEntry;
use giveabot_common::models::guild_settings::GuildSettings;
use giveabot_common::models::participant::{AdmitOutcome, ParticipantSnapshot};
use giveabot_common::traits::collaborators::{ContestNotifier, ParticipantDirectory};
use giveabot_common::traits::repository_traits::{
    ContestRepository, EntryRepository, GuildSettingsRepository,
};

#[derive(Default)]
pub struct MemoryContestRepository {
    contests: Mutex<HashMap<String, Contest>>,
}

impl MemoryContestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContestRepository for MemoryContestRepository {
    async fn create_contest(&self, contest: &Contest) -> Result<(), Error> {
        let mut map = self.contests.lock().unwrap();
        if map.contains_key(&contest.contest_id) {
            return Err(Error::Internal(format!(
                "duplicate contest id '{}'",
                contest.contest_id
            )));
        }
        map.insert(contest.contest_id.clone(), contest.clone());
        Ok(())
    }

    async fn get_contest(&self, contest_id: &str) -> Result<Option<Contest>, Error> {
        Ok(self.contests.lock().unwrap().get(contest_id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Contest>, Error> {
        let mut out: Vec<Contest> = self
            .contests
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.state == ContestState::Active)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.ends_at.cmp(&b.ends_at));
        Ok(out)
    }

    async fn list_active_for_guild(&self, guild_id: &str) -> Result<Vec<Contest>, Error> {
        let mut out: Vec<Contest> = self
            .contests
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.state == ContestState::Active && c.guild_id == guild_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.ends_at.cmp(&b.ends_at));
        Ok(out)
    }

    async fn try_mark_ended(&self, contest_id: &str) -> Result<bool, Error> {
        let mut map = self.contests.lock().unwrap();
        match map.get_mut(contest_id) {
            Some(c) if c.state == ContestState::Active => {
                c.state = ContestState::Ended;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_winners(&self, contest_id: &str, winners: &[String]) -> Result<(), Error> {
        let mut map = self.contests.lock().unwrap();
        match map.get_mut(contest_id) {
            Some(c) => {
                c.winners = winners.to_vec();
                Ok(())
            }
            None => Err(Error::NotFound(format!("contest '{contest_id}'"))),
        }
    }

    async fn update_roles(
        &self,
        contest_id: &str,
        bonus_roles: &[BonusRole],
        blacklisted_roles: &[String],
    ) -> Result<(), Error> {
        let mut map = self.contests.lock().unwrap();
        match map.get_mut(contest_id) {
            Some(c) if c.state == ContestState::Active => {
                c.bonus_roles = bonus_roles.to_vec();
                c.blacklisted_roles = blacklisted_roles.to_vec();
                Ok(())
            }
            _ => Err(Error::NotFound(format!(
                "no active contest '{contest_id}' to edit"
            ))),
        }
    }

    async fn count_for_guild(&self, guild_id: &str, active_only: bool) -> Result<i64, Error> {
        let map = self.contests.lock().unwrap();
        Ok(map
            .values()
            .filter(|c| {
                c.guild_id == guild_id && (!active_only || c.state == ContestState::Active)
            })
            .count() as i64)
    }

    async fn top_winners(&self, guild_id: &str, limit: i64) -> Result<Vec<(String, i64)>, Error> {
        let map = self.contests.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for c in map
            .values()
            .filter(|c| c.guild_id == guild_id && c.state == ContestState::Ended)
        {
            for w in &c.winners {
                *counts.entry(w.clone()).or_insert(0) += 1;
            }
        }
        let mut out: Vec<(String, i64)> = counts.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        out.truncate(limit as usize);
        Ok(out)
    }
}

#[derive(Default)]
pub struct MemoryEntryRepository {
    entries: Mutex<HashMap<(String, String), ContestEntry>>,
}

impl MemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test setup shortcut: force an entry into the ledger.
    pub fn seed(&self, entry: ContestEntry) {
        self.entries
            .lock()
            .unwrap()
            .insert((entry.contest_id.clone(), entry.user_id.clone()), entry);
    }
}

#[async_trait]
impl EntryRepository for MemoryEntryRepository {
    async fn try_admit(&self, entry: &ContestEntry) -> Result<AdmitOutcome, Error> {
        // One locked check-and-insert, mirroring the SQL
        // ON CONFLICT DO NOTHING statement's atomicity.
        let mut map = self.entries.lock().unwrap();
        let key = (entry.contest_id.clone(), entry.user_id.clone());
        if map.contains_key(&key) {
            return Ok(AdmitOutcome::AlreadyEntered);
        }
        map.insert(key, entry.clone());
        Ok(AdmitOutcome::Admitted)
    }

    async fn count_for_contest(&self, contest_id: &str) -> Result<i64, Error> {
        let map = self.entries.lock().unwrap();
        Ok(map.values().filter(|e| e.contest_id == contest_id).count() as i64)
    }

    async fn list_for_contest(&self, contest_id: &str) -> Result<Vec<ContestEntry>, Error> {
        let map = self.entries.lock().unwrap();
        let mut out: Vec<ContestEntry> = map
            .values()
            .filter(|e| e.contest_id == contest_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.entered_at
                .cmp(&b.entered_at)
                .then(a.user_id.cmp(&b.user_id))
        });
        Ok(out)
    }

    async fn mark_winners(&self, contest_id: &str, user_ids: &[String]) -> Result<(), Error> {
        let mut map = self.entries.lock().unwrap();
        for e in map.values_mut() {
            if e.contest_id == contest_id && user_ids.contains(&e.user_id) {
                e.is_winner = true;
            }
        }
        Ok(())
    }

    async fn revoke(&self, contest_id: &str, user_id: &str) -> Result<bool, Error> {
        let mut map = self.entries.lock().unwrap();
        Ok(map
            .remove(&(contest_id.to_string(), user_id.to_string()))
            .is_some())
    }

    async fn count_recent_awards(
        &self,
        user_id: &str,
        guild_id: &str,
        kind: ContestKind,
        since: DateTime<Utc>,
    ) -> Result<i64, Error> {
        let map = self.entries.lock().unwrap();
        Ok(map
            .values()
            .filter(|e| {
                e.user_id == user_id
                    && e.guild_id == guild_id
                    && e.kind == kind
                    && e.entered_at >= since
                    && (e.is_winner || e.claimed)
            })
            .count() as i64)
    }

    async fn top_participants(
        &self,
        guild_id: &str,
        limit: i64,
    ) -> Result<Vec<(String, i64)>, Error> {
        let map = self.entries.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for e in map.values().filter(|e| e.guild_id == guild_id) {
            *counts.entry(e.user_id.clone()).or_insert(0) += 1;
        }
        let mut out: Vec<(String, i64)> = counts.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        out.truncate(limit as usize);
        Ok(out)
    }
}

#[derive(Default)]
pub struct MemoryGuildSettingsRepository {
    settings: Mutex<HashMap<String, GuildSettings>>,
}

impl MemoryGuildSettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuildSettingsRepository for MemoryGuildSettingsRepository {
    async fn get_settings(&self, guild_id: &str) -> Result<Option<GuildSettings>, Error> {
        Ok(self.settings.lock().unwrap().get(guild_id).cloned())
    }

    async fn upsert_settings(&self, settings: &GuildSettings) -> Result<(), Error> {
        self.settings
            .lock()
            .unwrap()
            .insert(settings.guild_id.clone(), settings.clone());
        Ok(())
    }
}

/// Canned participant directory.
#[derive(Default)]
pub struct StaticDirectory {
    snapshots: Mutex<HashMap<(String, String), ParticipantSnapshot>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, snapshot: ParticipantSnapshot) {
        self.snapshots.lock().unwrap().insert(
            (snapshot.guild_id.clone(), snapshot.user_id.clone()),
            snapshot,
        );
    }

    pub fn remove(&self, guild_id: &str, user_id: &str) {
        self.snapshots
            .lock()
            .unwrap()
            .remove(&(guild_id.to_string(), user_id.to_string()));
    }
}

#[async_trait]
impl ParticipantDirectory for StaticDirectory {
    async fn snapshot(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<ParticipantSnapshot>, Error> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .get(&(guild_id.to_string(), user_id.to_string()))
            .cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyEvent {
    Ended {
        contest_id: String,
        winners: Vec<String>,
    },
    Delivered {
        contest_id: String,
        user_id: String,
    },
}

/// Records notifications; can be told to fail delivery for given users
/// to exercise the best-effort path.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotifyEvent>>,
    fail_delivery_for: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_delivery_for(&self, user_id: &str) {
        self.fail_delivery_for
            .lock()
            .unwrap()
            .push(user_id.to_string());
    }

    pub fn events(&self) -> Vec<NotifyEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn delivered_to(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                NotifyEvent::Delivered { user_id, .. } => Some(user_id),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ContestNotifier for RecordingNotifier {
    async fn contest_ended(&self, contest: &Contest, winners: &[String]) -> Result<(), Error> {
        self.events.lock().unwrap().push(NotifyEvent::Ended {
            contest_id: contest.contest_id.clone(),
            winners: winners.to_vec(),
        });
        Ok(())
    }

    async fn deliver_prize(&self, contest: &Contest, user_id: &str) -> Result<(), Error> {
        if self
            .fail_delivery_for
            .lock()
            .unwrap()
            .iter()
            .any(|u| u == user_id)
        {
            return Err(Error::Notification(format!(
                "DM to {user_id} rejected (test)"
            )));
        }
        self.events.lock().unwrap().push(NotifyEvent::Delivered {
            contest_id: contest.contest_id.clone(),
            user_id: user_id.to_string(),
        });
        Ok(())
    }
}
