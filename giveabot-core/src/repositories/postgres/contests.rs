// File: giveabot-core/src/repositories/postgres/contests.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use giveabot_common::error::Error;
use giveabot_common::models::contest::{BonusRole, Contest, ContestKind, ContestState};
use giveabot_common::traits::repository_traits::ContestRepository;

pub struct PostgresContestRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresContestRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_contest(r: &sqlx::postgres::PgRow) -> Result<Contest, Error> {
        let kind_str: String = r.try_get("kind")?;
        let state_str: String = r.try_get("state")?;
        let blacklisted_roles: serde_json::Value = r.try_get("blacklisted_roles")?;
        let bonus_roles: serde_json::Value = r.try_get("bonus_roles")?;
        let winners: serde_json::Value = r.try_get("winners")?;

        Ok(Contest {
            contest_id: r.try_get("contest_id")?,
            guild_id: r.try_get("guild_id")?,
            channel_id: r.try_get("channel_id")?,
            kind: ContestKind::from_str(&kind_str)?,
            prize: r.try_get("prize")?,
            platform: r.try_get("platform")?,
            secret_key: r.try_get("secret_key")?,
            winner_count: r.try_get("winner_count")?,
            hosted_by: r.try_get("hosted_by")?,
            required_role: r.try_get("required_role")?,
            boost_required: r.try_get("boost_required")?,
            blacklisted_roles: serde_json::from_value(blacklisted_roles)?,
            bonus_roles: serde_json::from_value(bonus_roles)?,
            state: ContestState::from_str(&state_str)?,
            winners: serde_json::from_value(winners)?,
            created_at: r.try_get("created_at")?,
            ends_at: r.try_get("ends_at")?,
        })
    }
}

const CONTEST_COLUMNS: &str = r#"
    contest_id,
    guild_id,
    channel_id,
    kind,
    prize,
    platform,
    secret_key,
    winner_count,
    hosted_by,
    required_role,
    boost_required,
    blacklisted_roles,
    bonus_roles,
    state,
    winners,
    created_at,
    ends_at
"#;

#[async_trait]
impl ContestRepository for PostgresContestRepository {
    async fn create_contest(&self, contest: &Contest) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO contests (
                contest_id,
                guild_id,
                channel_id,
                kind,
                prize,
                platform,
                secret_key,
                winner_count,
                hosted_by,
                required_role,
                boost_required,
                blacklisted_roles,
                bonus_roles,
                state,
                winners,
                created_at,
                ends_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)
            "#,
        )
        .bind(&contest.contest_id)
        .bind(&contest.guild_id)
        .bind(&contest.channel_id)
        .bind(contest.kind.as_str())
        .bind(&contest.prize)
        .bind(&contest.platform)
        .bind(&contest.secret_key)
        .bind(contest.winner_count)
        .bind(&contest.hosted_by)
        .bind(&contest.required_role)
        .bind(contest.boost_required)
        .bind(serde_json::to_value(&contest.blacklisted_roles)?)
        .bind(serde_json::to_value(&contest.bonus_roles)?)
        .bind(contest.state.as_str())
        .bind(serde_json::to_value(&contest.winners)?)
        .bind(contest.created_at)
        .bind(contest.ends_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_contest(&self, contest_id: &str) -> Result<Option<Contest>, Error> {
        let row_opt = sqlx::query(&format!(
            "SELECT {CONTEST_COLUMNS} FROM contests WHERE contest_id = $1"
        ))
        .bind(contest_id)
        .fetch_optional(&self.pool)
        .await?;

        match row_opt {
            Some(r) => Ok(Some(Self::row_to_contest(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_active(&self) -> Result<Vec<Contest>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTEST_COLUMNS} FROM contests WHERE state = 'active' ORDER BY ends_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            out.push(Self::row_to_contest(r)?);
        }
        Ok(out)
    }

    async fn list_active_for_guild(&self, guild_id: &str) -> Result<Vec<Contest>, Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CONTEST_COLUMNS} FROM contests
            WHERE guild_id = $1 AND state = 'active'
            ORDER BY ends_at ASC
            "#
        ))
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            out.push(Self::row_to_contest(r)?);
        }
        Ok(out)
    }

    async fn try_mark_ended(&self, contest_id: &str) -> Result<bool, Error> {
        // The WHERE clause is the check-and-set: only one of any number
        // of racing end triggers flips the row.
        let res = sqlx::query(
            r#"
            UPDATE contests
            SET state = 'ended'
            WHERE contest_id = $1 AND state = 'active'
            "#,
        )
        .bind(contest_id)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn set_winners(&self, contest_id: &str, winners: &[String]) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE contests
            SET winners = $2
            WHERE contest_id = $1
            "#,
        )
        .bind(contest_id)
        .bind(serde_json::to_value(winners)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_roles(
        &self,
        contest_id: &str,
        bonus_roles: &[BonusRole],
        blacklisted_roles: &[String],
    ) -> Result<(), Error> {
        let res = sqlx::query(
            r#"
            UPDATE contests
            SET bonus_roles = $2,
                blacklisted_roles = $3
            WHERE contest_id = $1 AND state = 'active'
            "#,
        )
        .bind(contest_id)
        .bind(serde_json::to_value(bonus_roles)?)
        .bind(serde_json::to_value(blacklisted_roles)?)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "no active contest '{contest_id}' to edit"
            )));
        }
        Ok(())
    }

    async fn count_for_guild(&self, guild_id: &str, active_only: bool) -> Result<i64, Error> {
        let row = if active_only {
            sqlx::query(
                "SELECT COUNT(*) AS cnt FROM contests WHERE guild_id = $1 AND state = 'active'",
            )
            .bind(guild_id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query("SELECT COUNT(*) AS cnt FROM contests WHERE guild_id = $1")
                .bind(guild_id)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(row.try_get::<i64, _>("cnt")?)
    }

    async fn top_winners(&self, guild_id: &str, limit: i64) -> Result<Vec<(String, i64)>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT w.user_id AS user_id, COUNT(*) AS wins
            FROM contests c,
                 jsonb_array_elements_text(c.winners) AS w(user_id)
            WHERE c.guild_id = $1 AND c.state = 'ended'
            GROUP BY w.user_id
            ORDER BY wins DESC, w.user_id ASC
            LIMIT $2
            "#,
        )
        .bind(guild_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            out.push((r.try_get("user_id")?, r.try_get("wins")?));
        }
        Ok(out)
    }
}
