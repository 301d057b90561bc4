// File: giveabot-core/src/repositories/postgres/entries.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use giveabot_common::error::Error;
use giveabot_common::models::contest::ContestKind;
use giveabot_common::models::entry::ContestEntry;
use giveabot_common::models::participant::AdmitOutcome;
use giveabot_common::traits::repository_traits::EntryRepository;

pub struct PostgresEntryRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresEntryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_entry(r: &sqlx::postgres::PgRow) -> Result<ContestEntry, Error> {
        let kind_str: String = r.try_get("kind")?;
        Ok(ContestEntry {
            contest_id: r.try_get("contest_id")?,
            user_id: r.try_get("user_id")?,
            guild_id: r.try_get("guild_id")?,
            kind: ContestKind::from_str(&kind_str)?,
            entered_at: r.try_get("entered_at")?,
            is_winner: r.try_get("is_winner")?,
            claimed: r.try_get("claimed")?,
        })
    }
}

#[async_trait]
impl EntryRepository for PostgresEntryRepository {
    async fn try_admit(&self, entry: &ContestEntry) -> Result<AdmitOutcome, Error> {
        // ON CONFLICT DO NOTHING makes the uniqueness check and the
        // insert one atomic statement; rows_affected tells us which side
        // of the race we were on.
        let res = sqlx::query(
            r#"
            INSERT INTO contest_entries (
                contest_id,
                user_id,
                guild_id,
                kind,
                entered_at,
                is_winner,
                claimed
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            ON CONFLICT (contest_id, user_id) DO NOTHING
            "#,
        )
        .bind(&entry.contest_id)
        .bind(&entry.user_id)
        .bind(&entry.guild_id)
        .bind(entry.kind.as_str())
        .bind(entry.entered_at)
        .bind(entry.is_winner)
        .bind(entry.claimed)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() > 0 {
            Ok(AdmitOutcome::Admitted)
        } else {
            Ok(AdmitOutcome::AlreadyEntered)
        }
    }

    async fn count_for_contest(&self, contest_id: &str) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM contest_entries WHERE contest_id = $1")
            .bind(contest_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("cnt")?)
    }

    async fn list_for_contest(&self, contest_id: &str) -> Result<Vec<ContestEntry>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT contest_id, user_id, guild_id, kind, entered_at, is_winner, claimed
            FROM contest_entries
            WHERE contest_id = $1
            ORDER BY entered_at ASC, user_id ASC
            "#,
        )
        .bind(contest_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            out.push(Self::row_to_entry(r)?);
        }
        Ok(out)
    }

    async fn mark_winners(&self, contest_id: &str, user_ids: &[String]) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE contest_entries
            SET is_winner = TRUE
            WHERE contest_id = $1 AND user_id = ANY($2)
            "#,
        )
        .bind(contest_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke(&self, contest_id: &str, user_id: &str) -> Result<bool, Error> {
        let res = sqlx::query(
            "DELETE FROM contest_entries WHERE contest_id = $1 AND user_id = $2",
        )
        .bind(contest_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn count_recent_awards(
        &self,
        user_id: &str,
        guild_id: &str,
        kind: ContestKind,
        since: DateTime<Utc>,
    ) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt
            FROM contest_entries
            WHERE user_id = $1
              AND guild_id = $2
              AND kind = $3
              AND entered_at >= $4
              AND (is_winner = TRUE OR claimed = TRUE)
            "#,
        )
        .bind(user_id)
        .bind(guild_id)
        .bind(kind.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get::<i64, _>("cnt")?)
    }

    async fn top_participants(
        &self,
        guild_id: &str,
        limit: i64,
    ) -> Result<Vec<(String, i64)>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, COUNT(*) AS entries
            FROM contest_entries
            WHERE guild_id = $1
            GROUP BY user_id
            ORDER BY entries DESC, user_id ASC
            LIMIT $2
            "#,
        )
        .bind(guild_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            out.push((r.try_get("user_id")?, r.try_get("entries")?));
        }
        Ok(out)
    }
}
