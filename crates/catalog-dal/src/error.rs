pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid record: {0}")]
    ValidationError(#[from] garde::Report),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Record is still referenced: {0}")]
    StillReferenced(String),

    #[error("Reference to missing record: {0}")]
    InvalidReference(String),

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),
}

impl Error {
    /// Maps constraint violations reported by the database to domain errors for given entity
    pub(crate) fn constraint(entity: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
        move |e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::AlreadyExists(entity.to_string())
            }
            sqlx::Error::Database(ref db) if is_foreign_key_violation(&**db) => {
                Error::StillReferenced(entity.to_string())
            }
            e => Error::DatabaseError(e),
        }
    }
}

/// SQLite reports refused `ON DELETE RESTRICT` as SQLITE_CONSTRAINT_TRIGGER,
/// not as SQLITE_CONSTRAINT_FOREIGNKEY
pub(crate) fn is_foreign_key_violation(db: &dyn sqlx::error::DatabaseError) -> bool {
    const SQLITE_CONSTRAINT_TRIGGER: &str = "1811";
    db.is_foreign_key_violation()
        || db.code().as_deref() == Some(SQLITE_CONSTRAINT_TRIGGER)
        || db.message().contains("FOREIGN KEY constraint failed")
}
