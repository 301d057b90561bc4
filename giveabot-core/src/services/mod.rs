// File: giveabot-core/src/services/mod.rs
pub mod claim_lock;
pub mod contest_service;
pub mod cooldown;
pub mod eligibility;
pub mod selection;

pub use claim_lock::ClaimLocks;
pub use contest_service::{ContestService, GuildContestStats};
pub use cooldown::CooldownGovernor;
pub use eligibility::{Eligibility, evaluate};
