use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{NewSchool, School};
use crate::db::DatabaseError;

use super::SchoolRepository;

const SCHOOL_COLUMNS: &str = "id, name, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct PgSchoolRepository {
    pool: PgPool,
}

impl PgSchoolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchoolRepository for PgSchoolRepository {
    async fn find(&self, id: Uuid) -> Result<Option<School>, DatabaseError> {
        let school = sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(school)
    }

    async fn list_active(&self) -> Result<Vec<School>, DatabaseError> {
        let schools = sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE is_active ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(schools)
    }

    async fn create(&self, new: &NewSchool) -> Result<School, DatabaseError> {
        let school = sqlx::query_as::<_, School>(&format!(
            "INSERT INTO schools (name) VALUES ($1) RETURNING {SCHOOL_COLUMNS}"
        ))
        .bind(&new.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(school)
    }

    async fn get_or_create(&self, name: &str) -> Result<School, DatabaseError> {
        // Upsert keyed on the unique name; concurrent backfill runs converge
        // on the same row.
        let school = sqlx::query_as::<_, School>(&format!(
            "INSERT INTO schools (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET updated_at = schools.updated_at \
             RETURNING {SCHOOL_COLUMNS}"
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(school)
    }
}
