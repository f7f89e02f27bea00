use thiserror::Error;

/// Failures raised while normalizing and projecting chain events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrdviewError {
    #[error("malformed chain event: {0}")]
    MalformedEvent(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl OrdviewError {
    /// A rollback targeting an absent record is a redelivery, not a contradiction.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::MalformedEvent(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Storage(_) => 500,
        }
    }
}

impl From<rusqlite::Error> for OrdviewError {
    fn from(e: rusqlite::Error) -> Self {
        OrdviewError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for OrdviewError {
    fn from(e: serde_json::Error) -> Self {
        OrdviewError::MalformedEvent(e.to_string())
    }
}
