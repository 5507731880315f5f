use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database deadlock. Carried as its own variant so the cycle-level
    /// retry can match structurally instead of sniffing message text.
    #[error("database deadlock: {0}")]
    Deadlock(String),

    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_deadlock(&self) -> bool {
        matches!(self, StoreError::Deadlock(_))
    }
}

// Postgres signals deadlock_detected with SQLSTATE 40P01.
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.code().as_deref() == Some("40P01") {
                return StoreError::Deadlock(db.message().to_string());
            }
        }
        StoreError::Internal(e.to_string())
    }
}
