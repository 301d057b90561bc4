// File: giveabot-core/src/repositories/postgres/guild_settings.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use giveabot_common::error::Error;
use giveabot_common::models::guild_settings::GuildSettings;
use giveabot_common::traits::repository_traits::GuildSettingsRepository;

pub struct PostgresGuildSettingsRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresGuildSettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuildSettingsRepository for PostgresGuildSettingsRepository {
    async fn get_settings(&self, guild_id: &str) -> Result<Option<GuildSettings>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT guild_id, giveaway_creation, drop_creation, cooldowns, blacklists
            FROM guild_settings
            WHERE guild_id = $1
            "#,
        )
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(r) = row_opt {
            let giveaway_creation: serde_json::Value = r.try_get("giveaway_creation")?;
            let drop_creation: serde_json::Value = r.try_get("drop_creation")?;
            let cooldowns: serde_json::Value = r.try_get("cooldowns")?;
            let blacklists: serde_json::Value = r.try_get("blacklists")?;

            let settings = GuildSettings {
                guild_id: r.try_get("guild_id")?,
                giveaway_creation: serde_json::from_value(giveaway_creation)?,
                drop_creation: serde_json::from_value(drop_creation)?,
                cooldowns: serde_json::from_value(cooldowns)?,
                blacklists: serde_json::from_value(blacklists)?,
            };
            Ok(Some(settings))
        } else {
            Ok(None)
        }
    }

    async fn upsert_settings(&self, settings: &GuildSettings) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO guild_settings (
                guild_id,
                giveaway_creation,
                drop_creation,
                cooldowns,
                blacklists,
                updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6)
            ON CONFLICT (guild_id) DO UPDATE
            SET giveaway_creation = EXCLUDED.giveaway_creation,
                drop_creation = EXCLUDED.drop_creation,
                cooldowns = EXCLUDED.cooldowns,
                blacklists = EXCLUDED.blacklists,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&settings.guild_id)
        .bind(serde_json::to_value(&settings.giveaway_creation)?)
        .bind(serde_json::to_value(&settings.drop_creation)?)
        .bind(serde_json::to_value(&settings.cooldowns)?)
        .bind(serde_json::to_value(&settings.blacklists)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
