#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("sqlite open failed at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create database parent {path}: {source}")]
    CreateParent {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sqlite statement failed: {source}")]
    Sql {
        #[source]
        source: rusqlite::Error,
    },
    #[error("constraint violated: {source}")]
    Constraint {
        #[source]
        source: rusqlite::Error,
    },
    #[error("requested one {entity}, got none ({criteria})")]
    NotFound {
        entity: &'static str,
        criteria: String,
    },
    #[error("requested one {entity}, got {count} ({criteria})")]
    MultipleResults {
        entity: &'static str,
        count: usize,
        criteria: String,
    },
    #[error("invalid chat role `{value}` in database")]
    InvalidRole { value: String },
    #[error("validation failed: {0}")]
    Validation(String),
}

impl PersistenceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub(crate) fn sql_error(source: rusqlite::Error) -> PersistenceError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &source {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            return PersistenceError::Constraint { source };
        }
    }
    PersistenceError::Sql { source }
}
