// File: giveabot-core/src/services/cooldown.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use giveabot_common::error::Error;
use giveabot_common::models::contest::ContestKind;
use giveabot_common::models::guild_settings::GuildSettings;
use giveabot_common::traits::repository_traits::EntryRepository;

/// Sliding-window rate limiter over the entry ledger. Only *successful
/// outcomes* (wins or claims) consume budget; entering often is free,
/// actually taking prizes home is not.
///
/// Advisory by design: this is a read with no slot reservation, so two
/// racing requests can both pass it. The ledger's uniqueness key remains
/// the hard gate, and the accepted worst case is one extra admission per
/// race window.
pub struct CooldownGovernor {
    entry_repo: Arc<dyn EntryRepository>,
}

impl CooldownGovernor {
    pub fn new(entry_repo: Arc<dyn EntryRepository>) -> Self {
        Self { entry_repo }
    }

    /// True when the participant is under the tenant's limit for this
    /// category (or when no limit is configured).
    pub async fn check(
        &self,
        user_id: &str,
        guild_id: &str,
        kind: ContestKind,
        settings: Option<&GuildSettings>,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let rule = match settings.and_then(|s| s.cooldowns.for_kind(kind)) {
            Some(r) => *r,
            None => return Ok(true),
        };

        let since = now - rule.window();
        let awarded = self
            .entry_repo
            .count_recent_awards(user_id, guild_id, kind, since)
            .await?;

        if awarded >= rule.key_limit {
            debug!(
                "cooldown hit for user={} guild={} kind={}: {} awards since {}",
                user_id,
                guild_id,
                kind.as_str(),
                awarded,
                since
            );
            return Ok(false);
        }
        Ok(true)
    }
}
