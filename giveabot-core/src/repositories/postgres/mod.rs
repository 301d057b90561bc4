// File: giveabot-core/src/repositories/postgres/mod.rs
pub mod contests;
pub mod entries;
pub mod guild_settings;

pub use contests::PostgresContestRepository;
pub use entries::PostgresEntryRepository;
pub use guild_settings::PostgresGuildSettingsRepository;
