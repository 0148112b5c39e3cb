use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Failures raised by the account layer and its storage collaborator.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User matching query does not exist.")]
    NotFound,
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("invalid global id: {0}")]
    InvalidId(String),
    #[error("password hashing failed: {0}")]
    Password(String),
    #[error(transparent)]
    Db(sqlx::Error),
}

const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for AccountError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AccountError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AccountError::ConstraintViolation(db.message().to_string())
            }
            _ => AccountError::Db(e),
        }
    }
}

impl AccountError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::InvalidId(_) => "INVALID_ID",
            Self::Password(_) | Self::Db(_) => "INTERNAL",
        }
    }
}

impl ErrorExtensions for AccountError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}
