use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no profile found for user '{0}'")]
    ProfileNotFound(String),

    #[error("not signed in; run `finmate login <email>` first")]
    NotSignedIn,

    #[error("an account already exists for '{0}'")]
    EmailTaken(String),

    #[error("invalid lesson catalog: {0}")]
    Catalog(String),

    #[error("{0}")]
    InvalidInput(String),
}
