// File: giveabot-common/src/models/mod.rs
pub mod contest;
pub mod entry;
pub mod guild_settings;
pub mod participant;

pub use contest::{BonusRole, Contest, ContestKind, ContestState};
pub use entry::ContestEntry;
pub use guild_settings::{
    BlacklistedUser, CategoryBlacklists, ContestCooldowns, CooldownRule, CreatorPermission,
    GuildSettings,
};
pub use participant::{
    AdmitOutcome, ClaimOutcome, ContestStatus, DenialReason, EnterOutcome, ParticipantSnapshot,
};
