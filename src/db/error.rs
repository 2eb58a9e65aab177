use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        // Unique-constraint violations are ordinary conflict outcomes, not
        // internal failures. The database is the authority here; application
        // pre-checks are a convenience.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DatabaseError::Duplicate;
            }
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return DatabaseError::NotFound;
        }
        DatabaseError::Sqlx(err)
    }
}
