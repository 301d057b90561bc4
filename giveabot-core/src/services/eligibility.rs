// File: giveabot-core/src/services/eligibility.rs
//
// Pure predicate deciding whether a participant may enter a contest.
// Checks run in a fixed order and the first failure wins, so the denial
// message a user sees is deterministic for a given state of the world.

use chrono::{DateTime, Utc};

use giveabot_common::models::contest::Contest;
use giveabot_common::models::guild_settings::GuildSettings;
use giveabot_common::models::participant::{DenialReason, ParticipantSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Allowed,
    Denied(DenialReason),
}

impl Eligibility {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Eligibility::Allowed)
    }
}

/// Check order: contest still running, tenant blacklist, required role,
/// boost requirement, blacklisted roles. No I/O; everything needed is in
/// the arguments.
pub fn evaluate(
    contest: &Contest,
    snapshot: &ParticipantSnapshot,
    settings: Option<&GuildSettings>,
    now: DateTime<Utc>,
) -> Eligibility {
    if !contest.is_active() || contest.is_expired(now) {
        return Eligibility::Denied(DenialReason::ContestEnded);
    }

    if let Some(s) = settings {
        if let Some(entry) = s.blacklists.lookup(contest.kind, &snapshot.user_id) {
            return Eligibility::Denied(DenialReason::Blacklisted {
                reason: entry.reason.clone(),
            });
        }
    }

    if let Some(required) = &contest.required_role {
        if !snapshot.holds_role(required) {
            return Eligibility::Denied(DenialReason::MissingRequiredRole);
        }
    }

    if contest.boost_required && !snapshot.is_booster {
        return Eligibility::Denied(DenialReason::BoosterOnly);
    }

    if contest
        .blacklisted_roles
        .iter()
        .any(|r| snapshot.holds_role(r))
    {
        return Eligibility::Denied(DenialReason::BlacklistedRole);
    }

    Eligibility::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use giveabot_common::models::contest::{ContestKind, ContestState};
    use giveabot_common::models::guild_settings::BlacklistedUser;

    fn contest(now: DateTime<Utc>) -> Contest {
        Contest {
            contest_id: "c1".into(),
            guild_id: "g1".into(),
            channel_id: "ch1".into(),
            kind: ContestKind::Giveaway,
            prize: "a key".into(),
            platform: None,
            secret_key: None,
            winner_count: 1,
            hosted_by: None,
            required_role: None,
            boost_required: false,
            blacklisted_roles: vec![],
            bonus_roles: vec![],
            state: ContestState::Active,
            winners: vec![],
            created_at: now - Duration::minutes(5),
            ends_at: now + Duration::hours(1),
        }
    }

    fn snapshot() -> ParticipantSnapshot {
        ParticipantSnapshot {
            user_id: "u1".into(),
            guild_id: "g1".into(),
            role_ids: vec!["r-common".into()],
            is_booster: false,
        }
    }

    #[test]
    fn expired_contest_denies_before_anything_else() {
        let now = Utc::now();
        let mut c = contest(now);
        c.ends_at = now - Duration::seconds(1);
        // Also blacklist the role, to prove check order.
        c.blacklisted_roles = vec!["r-common".into()];
        assert_eq!(
            evaluate(&c, &snapshot(), None, now),
            Eligibility::Denied(DenialReason::ContestEnded)
        );
    }

    #[test]
    fn tenant_blacklist_outranks_role_checks() {
        let now = Utc::now();
        let mut c = contest(now);
        c.required_role = Some("r-missing".into());

        let mut settings = GuildSettings::new("g1");
        settings.blacklists.giveaways.push(BlacklistedUser {
            user_id: "u1".into(),
            reason: Some("spam".into()),
        });

        assert_eq!(
            evaluate(&c, &snapshot(), Some(&settings), now),
            Eligibility::Denied(DenialReason::Blacklisted {
                reason: Some("spam".into())
            })
        );
    }

    #[test]
    fn required_role_then_boost_then_blacklisted_roles() {
        let now = Utc::now();
        let snap = snapshot();

        let mut c = contest(now);
        c.required_role = Some("r-sub".into());
        assert_eq!(
            evaluate(&c, &snap, None, now),
            Eligibility::Denied(DenialReason::MissingRequiredRole)
        );

        let mut c = contest(now);
        c.boost_required = true;
        assert_eq!(
            evaluate(&c, &snap, None, now),
            Eligibility::Denied(DenialReason::BoosterOnly)
        );

        let mut c = contest(now);
        c.blacklisted_roles = vec!["r-common".into()];
        assert_eq!(
            evaluate(&c, &snap, None, now),
            Eligibility::Denied(DenialReason::BlacklistedRole)
        );
    }

    #[test]
    fn clean_participant_is_allowed() {
        let now = Utc::now();
        assert!(evaluate(&contest(now), &snapshot(), None, now).is_allowed());
    }
}
