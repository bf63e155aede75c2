use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Team, TeamFields};
use crate::store::TeamStore;

const TEAM_COLUMNS: &str = r#"
    id, name, match_type, region, city, district, dong, skill_level, skill,
    pro_players, has_field, address, intro, contact, foundation_year,
    photo_url, profile_image, user_id, created_at
"#;

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamStore for TeamRepository {
    async fn list(&self) -> Result<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Team> {
        sqlx::query_as::<_, Team>(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    async fn create(&self, fields: &TeamFields, owner: Option<Uuid>) -> Result<Team> {
        let team = sqlx::query_as::<_, Team>(&format!(
            r#"
            INSERT INTO teams (name, match_type, region, city, district, dong, skill_level,
                               pro_players, has_field, address, intro, contact,
                               foundation_year, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(&fields.name)
        .bind(fields.match_type.as_str())
        .bind(fields.region.label())
        .bind(&fields.region.city)
        .bind(&fields.region.district)
        .bind(&fields.region.neighborhood)
        .bind(fields.skill_level.as_str())
        .bind(fields.pro_players)
        .bind(fields.has_field)
        .bind(&fields.address)
        .bind(&fields.intro)
        .bind(&fields.contact)
        .bind(fields.foundation_year)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(team)
    }

    async fn update(&self, id: Uuid, fields: &TeamFields) -> Result<Team> {
        sqlx::query_as::<_, Team>(&format!(
            r#"
            UPDATE teams
            SET name = $2,
                match_type = $3,
                region = $4,
                city = $5,
                district = $6,
                dong = $7,
                skill_level = $8,
                pro_players = $9,
                has_field = $10,
                address = $11,
                intro = $12,
                contact = $13,
                foundation_year = $14
            WHERE id = $1
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(fields.match_type.as_str())
        .bind(fields.region.label())
        .bind(&fields.region.city)
        .bind(&fields.region.district)
        .bind(&fields.region.neighborhood)
        .bind(fields.skill_level.as_str())
        .bind(fields.pro_players)
        .bind(fields.has_field)
        .bind(&fields.address)
        .bind(&fields.intro)
        .bind(&fields.contact)
        .bind(fields.foundation_year)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    async fn set_photo_url(&self, id: Uuid, url: &str) -> Result<Team> {
        sqlx::query_as::<_, Team>(&format!(
            "UPDATE teams SET photo_url = $2 WHERE id = $1 RETURNING {TEAM_COLUMNS}"
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
