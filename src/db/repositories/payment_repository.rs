use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{NewPayment, Payment, PaymentStatus};
use crate::db::DatabaseError;

use super::PaymentRepository;

const PAYMENT_COLUMNS: &str = "id, registration_id, transaction_id, amount, currency, \
     payment_status, payment_method, gateway_payload, initiated_at, completed_at";

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn insert(&self, new: &NewPayment) -> Result<Payment, DatabaseError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments \
             (registration_id, transaction_id, amount, currency, payment_method, gateway_payload) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(new.registration_id)
        .bind(&new.transaction_id)
        .bind(new.amount)
        .bind(&new.currency)
        .bind(new.payment_method)
        .bind(&new.gateway_payload)
        .fetch_one(&self.pool)
        .await?;
        Ok(payment)
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, DatabaseError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }

    async fn find_by_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Payment>, DatabaseError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE registration_id = $1"
        ))
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }

    async fn transition(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        gateway_payload: Option<serde_json::Value>,
    ) -> Result<Payment, DatabaseError> {
        // The payment row and the parent registration's mirrored status must
        // never diverge: both updates commit together or not at all.
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments SET \
                payment_status = $1, \
                completed_at = CASE WHEN $1 = 'completed'::payment_status \
                                    THEN now() ELSE completed_at END, \
                gateway_payload = COALESCE($2, gateway_payload) \
             WHERE id = $3 \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(status)
        .bind(&gateway_payload)
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DatabaseError::NotFound)?;

        sqlx::query(
            "UPDATE registrations SET payment_status = $1, updated_at = now() WHERE id = $2",
        )
        .bind(status.registration_status())
        .bind(payment.registration_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(payment)
    }

    async fn completed_revenue(&self) -> Result<Decimal, DatabaseError> {
        let (total,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE payment_status = 'completed'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}
