// File: giveabot-core/tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};

use giveabot_common::models::contest::{Contest, ContestKind, ContestState};
use giveabot_common::models::participant::ParticipantSnapshot;
use giveabot_common::traits::collaborators::{ContestNotifier, ParticipantDirectory};
use giveabot_common::traits::repository_traits::{
    ContestRepository, EntryRepository, GuildSettingsRepository,
};
use giveabot_core::services::ContestService;
use giveabot_core::test_utils::memory::{
    MemoryContestRepository, MemoryEntryRepository, MemoryGuildSettingsRepository,
    RecordingNotifier, StaticDirectory,
};

pub struct TestHarness {
    pub service: Arc<ContestService>,
    pub contests: Arc<MemoryContestRepository>,
    pub entries: Arc<MemoryEntryRepository>,
    pub settings: Arc<MemoryGuildSettingsRepository>,
    pub directory: Arc<StaticDirectory>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> TestHarness {
    let contests = Arc::new(MemoryContestRepository::new());
    let entries = Arc::new(MemoryEntryRepository::new());
    let settings = Arc::new(MemoryGuildSettingsRepository::new());
    let directory = Arc::new(StaticDirectory::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let service = Arc::new(ContestService::new(
        Arc::clone(&contests) as Arc<dyn ContestRepository>,
        Arc::clone(&entries) as Arc<dyn EntryRepository>,
        Arc::clone(&settings) as Arc<dyn GuildSettingsRepository>,
        Arc::clone(&directory) as Arc<dyn ParticipantDirectory>,
        Arc::clone(&notifier) as Arc<dyn ContestNotifier>,
    ));

    TestHarness {
        service,
        contests,
        entries,
        settings,
        directory,
        notifier,
    }
}

pub fn giveaway(contest_id: &str, guild_id: &str, hours: i64, winner_count: i32) -> Contest {
    let now = Utc::now();
    Contest {
        contest_id: contest_id.to_string(),
        guild_id: guild_id.to_string(),
        channel_id: "chan-1".to_string(),
        kind: ContestKind::Giveaway,
        prize: "Steam key".to_string(),
        platform: Some("Steam".to_string()),
        secret_key: Some("AAAA-BBBB-CCCC".to_string()),
        winner_count,
        hosted_by: Some("host-1".to_string()),
        required_role: None,
        boost_required: false,
        blacklisted_roles: vec![],
        bonus_roles: vec![],
        state: ContestState::Active,
        winners: vec![],
        created_at: now,
        ends_at: now + Duration::hours(hours),
    }
}

pub fn drop_contest(contest_id: &str, guild_id: &str, minutes: i64) -> Contest {
    Contest {
        kind: ContestKind::Drop,
        winner_count: 1,
        ends_at: Utc::now() + Duration::minutes(minutes),
        ..giveaway(contest_id, guild_id, 1, 1)
    }
}

pub fn snapshot(user_id: &str, guild_id: &str, roles: &[&str], is_booster: bool) -> ParticipantSnapshot {
    ParticipantSnapshot {
        user_id: user_id.to_string(),
        guild_id: guild_id.to_string(),
        role_ids: roles.iter().map(|r| r.to_string()).collect(),
        is_booster,
    }
}
