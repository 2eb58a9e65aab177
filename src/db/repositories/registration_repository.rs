use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{
    ExportRow, NewRegistration, Registration, RegistrationFilter, RegistrationStatus,
    StatusBreakdown,
};
use crate::db::DatabaseError;

use super::RegistrationRepository;

const REGISTRATION_COLUMNS: &str = "id, registration_number, workshop_id, student_name, grade, \
     school_id, school_name, contact_number, email, payment_status, registered_at, updated_at";

#[derive(Clone)]
pub struct PgRegistrationRepository {
    pool: PgPool,
}

impl PgRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationRepository for PgRegistrationRepository {
    async fn insert(&self, new: &NewRegistration) -> Result<Registration, DatabaseError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "INSERT INTO registrations \
             (registration_number, workshop_id, student_name, grade, school_id, school_name, \
              contact_number, email, payment_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(&new.registration_number)
        .bind(new.workshop_id)
        .bind(&new.student_name)
        .bind(new.grade)
        .bind(new.school_id)
        .bind(&new.school_name)
        .bind(&new.contact_number)
        .bind(&new.email)
        .bind(new.payment_status)
        .fetch_one(&self.pool)
        .await?;
        Ok(registration)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Registration>, DatabaseError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(registration)
    }

    async fn email_registered(
        &self,
        workshop_id: Uuid,
        email: &str,
    ) -> Result<bool, DatabaseError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM registrations WHERE workshop_id = $1 AND email = $2)",
        )
        .bind(workshop_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE registrations SET payment_status = $1, updated_at = now() WHERE id = $2",
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &RegistrationFilter,
    ) -> Result<Vec<Registration>, DatabaseError> {
        let registrations = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE ($1::uuid IS NULL OR workshop_id = $1) \
               AND ($2::registration_status IS NULL OR payment_status = $2) \
               AND ($3::text IS NULL \
                    OR student_name ILIKE '%' || $3 || '%' \
                    OR email ILIKE '%' || $3 || '%' \
                    OR registration_number ILIKE '%' || $3 || '%') \
             ORDER BY registered_at DESC"
        ))
        .bind(filter.workshop_id)
        .bind(filter.status)
        .bind(&filter.search)
        .fetch_all(&self.pool)
        .await?;
        Ok(registrations)
    }

    async fn export_rows(
        &self,
        filter: &RegistrationFilter,
    ) -> Result<Vec<ExportRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PgExportRow>(
            "SELECT r.registration_number, w.name AS workshop_name, \
                    w.workshop_date, r.student_name, r.grade, \
                    COALESCE(s.name, r.school_name) AS school, \
                    r.contact_number, r.email, r.payment_status, w.fee, r.registered_at \
             FROM registrations r \
             JOIN workshops w ON w.id = r.workshop_id \
             LEFT JOIN schools s ON s.id = r.school_id \
             WHERE ($1::uuid IS NULL OR r.workshop_id = $1) \
               AND ($2::registration_status IS NULL OR r.payment_status = $2) \
               AND ($3::text IS NULL \
                    OR r.student_name ILIKE '%' || $3 || '%' \
                    OR r.email ILIKE '%' || $3 || '%' \
                    OR r.registration_number ILIKE '%' || $3 || '%') \
             ORDER BY r.registered_at DESC",
        )
        .bind(filter.workshop_id)
        .bind(filter.status)
        .bind(&filter.search)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ExportRow::from).collect())
    }

    async fn count_all(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM registrations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn status_breakdown(&self) -> Result<StatusBreakdown, DatabaseError> {
        let rows: Vec<(RegistrationStatus, i64)> = sqlx::query_as(
            "SELECT payment_status, COUNT(*) FROM registrations GROUP BY payment_status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut breakdown = StatusBreakdown::default();
        for (status, count) in rows {
            match status {
                RegistrationStatus::Pending => breakdown.pending = count,
                RegistrationStatus::Completed => breakdown.completed = count,
                RegistrationStatus::Failed => breakdown.failed = count,
                RegistrationStatus::Cancelled => breakdown.cancelled = count,
                RegistrationStatus::Free => breakdown.free = count,
            }
        }
        Ok(breakdown)
    }

    async fn mark_completed_bulk(&self, ids: &[Uuid]) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE registrations SET payment_status = 'completed', updated_at = now() \
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_unresolved_schools(&self) -> Result<Vec<Registration>, DatabaseError> {
        let registrations = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE school_id IS NULL AND school_name <> ''"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(registrations)
    }

    async fn set_school(&self, id: Uuid, school_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE registrations SET school_id = $1, updated_at = now() WHERE id = $2",
        )
        .bind(school_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct PgExportRow {
    registration_number: String,
    workshop_name: String,
    workshop_date: String,
    student_name: String,
    grade: i16,
    school: String,
    contact_number: String,
    email: String,
    payment_status: RegistrationStatus,
    fee: rust_decimal::Decimal,
    registered_at: time::OffsetDateTime,
}

impl From<PgExportRow> for ExportRow {
    fn from(row: PgExportRow) -> Self {
        ExportRow {
            registration_number: row.registration_number,
            workshop_name: row.workshop_name,
            workshop_date: row.workshop_date,
            student_name: row.student_name,
            grade: row.grade,
            school: row.school,
            contact_number: row.contact_number,
            email: row.email,
            payment_status: row.payment_status,
            fee: row.fee,
            registered_at: row.registered_at,
        }
    }
}
