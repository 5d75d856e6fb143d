use crate::entries::EntryError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("entry with id {0} already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    Invalid(#[from] EntryError),

    #[error("{0}")]
    BadRequest(String),

    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}
