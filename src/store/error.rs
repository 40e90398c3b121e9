use thiserror::Error;

/// Everything a quote store operation can fail with.
///
/// None of these are fatal: the in-memory collection stays usable after any of them.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("both a quote and a category are required")]
    Validation,

    #[error("invalid quotes file: {0}")]
    Format(#[from] FormatError),

    #[error("couldn't persist quotes: {0}")]
    Persist(#[from] PersistError),

    #[error("remote request failed: {0}")]
    Remote(#[from] RemoteError),
}

/// Serialized data isn't an array of quote records.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON must be an array")]
    NotAnArray,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("couldn't encode value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage quota exceeded ({needed} bytes needed, quota is {quota})")]
    QuotaExceeded { needed: usize, quota: usize },
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),
}
