// File: giveabot-common/src/traits/collaborators.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::contest::Contest;
use crate::models::participant::ParticipantSnapshot;

/// Resolves a participant's current roles/boost status at selection
/// time. Backed by the platform layer (gateway cache or HTTP) in the
/// real bot; tests supply a canned directory.
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// None when the participant has left the guild; the selection
    /// engine then skips them, matching the original behavior.
    async fn snapshot(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<ParticipantSnapshot>, Error>;
}

/// Outbound announcements and prize delivery. Best-effort: the scheduler
/// logs failures and keeps going; selection results are authoritative
/// regardless of what happens here.
#[async_trait]
pub trait ContestNotifier: Send + Sync {
    /// Public end-of-contest announcement (possibly with zero winners).
    async fn contest_ended(&self, contest: &Contest, winners: &[String]) -> Result<(), Error>;

    /// Private delivery of the win (and the secret payload, if any) to a
    /// single winner.
    async fn deliver_prize(&self, contest: &Contest, user_id: &str) -> Result<(), Error>;
}
