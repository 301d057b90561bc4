// File: giveabot-common/src/traits/mod.rs
pub mod collaborators;
pub mod repository_traits;
