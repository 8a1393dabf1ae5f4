use thiserror::Error;

/// Failures coming out of the persistence layer.
///
/// Absence is never an error here: lookups return `Ok(None)` and callers
/// decide whether that means 404 or "not signed in".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database pool unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The unique index on `posts.slug` rejected a write.
    #[error("slug '{0}' is already taken")]
    SlugTaken(String),

    #[error("could not allocate a free slug for '{0}'")]
    SlugRetriesExhausted(String),
}

impl StoreError {
    /// Classify a write error against `posts`, turning a unique-index
    /// violation on the slug column into `SlugTaken`.
    pub fn from_post_write(err: rusqlite::Error, slug: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, Some(msg))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
                    && msg.contains("posts.slug") =>
            {
                StoreError::SlugTaken(slug.to_string())
            }
            _ => StoreError::Sqlite(err),
        }
    }
}
