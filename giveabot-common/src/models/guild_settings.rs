// File: giveabot-common/src/models/guild_settings.rs

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::contest::ContestKind;
use super::participant::ParticipantSnapshot;

/// Who may create contests of a given category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CreatorPermission {
    #[default]
    Everyone,
    Role {
        role_id: String,
    },
}

/// Sliding-window cap on *successful outcomes* (wins / claims), not on
/// mere participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownRule {
    pub key_limit: i64,
    pub window_seconds: i64,
}

impl CooldownRule {
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContestCooldowns {
    pub giveaways: Option<CooldownRule>,
    pub drops: Option<CooldownRule>,
}

impl ContestCooldowns {
    pub fn for_kind(&self, kind: ContestKind) -> Option<&CooldownRule> {
        match kind {
            ContestKind::Giveaway => self.giveaways.as_ref(),
            ContestKind::Drop => self.drops.as_ref(),
        }
    }

    pub fn set_for_kind(&mut self, kind: ContestKind, rule: Option<CooldownRule>) {
        match kind {
            ContestKind::Giveaway => self.giveaways = rule,
            ContestKind::Drop => self.drops = rule,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistedUser {
    pub user_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryBlacklists {
    pub giveaways: Vec<BlacklistedUser>,
    pub drops: Vec<BlacklistedUser>,
}

impl CategoryBlacklists {
    pub fn for_kind(&self, kind: ContestKind) -> &[BlacklistedUser] {
        match kind {
            ContestKind::Giveaway => &self.giveaways,
            ContestKind::Drop => &self.drops,
        }
    }

    pub fn for_kind_mut(&mut self, kind: ContestKind) -> &mut Vec<BlacklistedUser> {
        match kind {
            ContestKind::Giveaway => &mut self.giveaways,
            ContestKind::Drop => &mut self.drops,
        }
    }

    pub fn lookup(&self, kind: ContestKind, user_id: &str) -> Option<&BlacklistedUser> {
        self.for_kind(kind).iter().find(|b| b.user_id == user_id)
    }
}

/// Per-guild (tenant) configuration. Owned by the configuration
/// collaborator; the core mostly reads it, except for the moderation
/// blacklist operation which also revokes live entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildSettings {
    pub guild_id: String,
    pub giveaway_creation: CreatorPermission,
    pub drop_creation: CreatorPermission,
    pub cooldowns: ContestCooldowns,
    pub blacklists: CategoryBlacklists,
}

impl GuildSettings {
    pub fn new(guild_id: &str) -> Self {
        Self {
            guild_id: guild_id.to_string(),
            giveaway_creation: CreatorPermission::default(),
            drop_creation: CreatorPermission::default(),
            cooldowns: ContestCooldowns::default(),
            blacklists: CategoryBlacklists::default(),
        }
    }

    pub fn creation_rule(&self, kind: ContestKind) -> &CreatorPermission {
        match kind {
            ContestKind::Giveaway => &self.giveaway_creation,
            ContestKind::Drop => &self.drop_creation,
        }
    }

    /// Whether `snapshot` may create contests of `kind`. Guild managers
    /// always may, matching the original's ManageGuild bypass.
    pub fn may_create(
        &self,
        kind: ContestKind,
        snapshot: &ParticipantSnapshot,
        has_manage_guild: bool,
    ) -> bool {
        if has_manage_guild {
            return true;
        }
        match self.creation_rule(kind) {
            CreatorPermission::Everyone => true,
            CreatorPermission::Role { role_id } => snapshot.holds_role(role_id),
        }
    }
}
