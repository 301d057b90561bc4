// File: giveabot-core/src/tasks/mod.rs
pub mod expiration;
