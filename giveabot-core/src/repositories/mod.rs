// File: giveabot-core/src/repositories/mod.rs
pub mod postgres;

pub use giveabot_common::traits::repository_traits::{
    ContestRepository, EntryRepository, GuildSettingsRepository,
};
