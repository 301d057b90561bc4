// File: giveabot-core/src/services/selection.rs
//
// Weighted winner selection without replacement. The pool is small in
// practice (a guild's entrants), so the slot-expansion approach the
// original bot used is kept rather than a cumulative-weight tree.

use rand::Rng;

use giveabot_common::models::contest::BonusRole;
use giveabot_common::models::participant::ParticipantSnapshot;

/// Entry weight for a participant: product of the multipliers of every
/// bonus role they hold, 1 when none apply.
pub fn weight_for(snapshot: &ParticipantSnapshot, bonus_roles: &[BonusRole]) -> u32 {
    let mut weight: u32 = 1;
    for bonus in bonus_roles {
        if snapshot.holds_role(&bonus.role_id) {
            weight = weight.saturating_mul(bonus.multiplier);
        }
    }
    weight.max(1)
}

/// Draws up to `quota` distinct winners from `pool`, each draw
/// proportional to the participant's remaining weight. After a win every
/// slot of that participant is removed, so nobody is drawn twice.
///
/// Pure in (pool, quota, rng): a seeded Rng reproduces the exact winner
/// sequence.
pub fn select_winners<R: Rng + ?Sized>(
    pool: &[(String, u32)],
    quota: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut slots: Vec<&str> = Vec::new();
    for (user_id, weight) in pool {
        for _ in 0..*weight {
            slots.push(user_id.as_str());
        }
    }

    let mut winners: Vec<String> = Vec::new();
    while winners.len() < quota && !slots.is_empty() {
        let idx = rng.random_range(0..slots.len());
        let winner = slots[idx].to_string();
        slots.retain(|id| *id != winner);
        winners.push(winner);
    }
    winners
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn snap(roles: &[&str]) -> ParticipantSnapshot {
        ParticipantSnapshot {
            user_id: "u".into(),
            guild_id: "g".into(),
            role_ids: roles.iter().map(|r| r.to_string()).collect(),
            is_booster: false,
        }
    }

    #[test]
    fn multipliers_multiply_not_add() {
        let bonus = vec![
            BonusRole { role_id: "a".into(), multiplier: 2 },
            BonusRole { role_id: "b".into(), multiplier: 3 },
        ];
        assert_eq!(weight_for(&snap(&[]), &bonus), 1);
        assert_eq!(weight_for(&snap(&["a"]), &bonus), 2);
        assert_eq!(weight_for(&snap(&["a", "b"]), &bonus), 6);
    }

    #[test]
    fn never_picks_the_same_participant_twice() {
        let pool = vec![
            ("u1".to_string(), 10),
            ("u2".to_string(), 10),
            ("u3".to_string(), 10),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let winners = select_winners(&pool, 3, &mut rng);
            assert_eq!(winners.len(), 3);
            let mut sorted = winners.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), 3, "duplicate winner in {winners:?}");
        }
    }

    #[test]
    fn quota_capped_by_distinct_participants() {
        let pool = vec![("u1".to_string(), 5), ("u2".to_string(), 1)];
        let mut rng = StdRng::seed_from_u64(1);
        let winners = select_winners(&pool, 10, &mut rng);
        assert_eq!(winners.len(), 2);
    }

    #[test]
    fn empty_pool_yields_no_winners() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_winners(&[], 3, &mut rng).is_empty());
    }

    #[test]
    fn draw_probability_tracks_weight() {
        // A:1 vs B:3 over 10_000 single-winner draws: B should win about
        // 75% of the time. 3-sigma for a binomial(10_000, 0.75) is ~130,
        // so a +/-300 band is comfortably loose and still meaningful.
        let pool = vec![("A".to_string(), 1), ("B".to_string(), 3)];
        let mut rng = StdRng::seed_from_u64(42);
        let mut b_wins = 0;
        for _ in 0..10_000 {
            if select_winners(&pool, 1, &mut rng)[0] == "B" {
                b_wins += 1;
            }
        }
        assert!(
            (7_200..=7_800).contains(&b_wins),
            "B won {b_wins}/10000, expected around 7500"
        );
    }
}
