// File: giveabot-core/src/tasks/expiration.rs
//
// Detached expiration timers. Each task holds only a contest id; current
// state is re-resolved from the store at fire time, so an arbitrarily
// delayed or duplicated fire is harmless (the state CAS turns it into a
// no-op).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::debug;

use crate::services::contest_service::ContestService;

pub fn spawn_expiration_timer(
    service: Arc<ContestService>,
    contest_id: String,
    ends_at: DateTime<Utc>,
) {
    tokio::spawn(async move {
        let remaining = (ends_at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        debug!(
            "Armed expiration timer for contest {} ({:?} remaining)",
            contest_id, remaining
        );
        sleep(remaining).await;
        service.run_end_of_contest(&contest_id).await;
    });
}
