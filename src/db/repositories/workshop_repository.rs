use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{NewWorkshop, UpdateWorkshop, Workshop};
use crate::db::DatabaseError;

use super::WorkshopRepository;

const WORKSHOP_COLUMNS: &str = "id, name, description, workshop_date, workshop_time, duration, \
     venue, organizer, fee, capacity, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct PgWorkshopRepository {
    pool: PgPool,
}

impl PgWorkshopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkshopRepository for PgWorkshopRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Workshop>, DatabaseError> {
        let workshop = sqlx::query_as::<_, Workshop>(&format!(
            "SELECT {WORKSHOP_COLUMNS} FROM workshops WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(workshop)
    }

    async fn list_active(&self) -> Result<Vec<Workshop>, DatabaseError> {
        let workshops = sqlx::query_as::<_, Workshop>(&format!(
            "SELECT {WORKSHOP_COLUMNS} FROM workshops WHERE is_active ORDER BY workshop_date, name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(workshops)
    }

    async fn count_active(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM workshops WHERE is_active")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn create(&self, new: &NewWorkshop) -> Result<Workshop, DatabaseError> {
        let workshop = sqlx::query_as::<_, Workshop>(&format!(
            "INSERT INTO workshops \
             (name, description, workshop_date, workshop_time, duration, venue, organizer, fee, capacity, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {WORKSHOP_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.workshop_date)
        .bind(&new.workshop_time)
        .bind(&new.duration)
        .bind(&new.venue)
        .bind(&new.organizer)
        .bind(new.fee)
        .bind(new.capacity)
        .bind(new.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(workshop)
    }

    async fn update(&self, id: Uuid, update: &UpdateWorkshop) -> Result<Workshop, DatabaseError> {
        let workshop = sqlx::query_as::<_, Workshop>(&format!(
            "UPDATE workshops SET \
                name = COALESCE($1, name), \
                description = COALESCE($2, description), \
                workshop_date = COALESCE($3, workshop_date), \
                workshop_time = COALESCE($4, workshop_time), \
                duration = COALESCE($5, duration), \
                venue = COALESCE($6, venue), \
                organizer = COALESCE($7, organizer), \
                fee = COALESCE($8, fee), \
                capacity = COALESCE($9, capacity), \
                is_active = COALESCE($10, is_active), \
                updated_at = now() \
             WHERE id = $11 \
             RETURNING {WORKSHOP_COLUMNS}"
        ))
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.workshop_date)
        .bind(&update.workshop_time)
        .bind(&update.duration)
        .bind(&update.venue)
        .bind(&update.organizer)
        .bind(update.fee)
        .bind(update.capacity)
        .bind(update.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound)?;
        Ok(workshop)
    }

    async fn confirmed_count(&self, workshop_id: Uuid) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations \
             WHERE workshop_id = $1 AND payment_status IN ('completed', 'free')",
        )
        .bind(workshop_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn reserved_count(&self, workshop_id: Uuid) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations r \
             JOIN payments p ON p.registration_id = r.id \
             WHERE r.workshop_id = $1 AND p.payment_status = 'pending'",
        )
        .bind(workshop_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
