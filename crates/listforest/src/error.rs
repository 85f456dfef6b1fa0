use thiserror::Error;

use crate::model::{ItemId, ListId};

#[derive(Error, Debug)]
pub enum ForestError {
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Cannot move list {list} under item {candidate}: the item does not hang under a top-level list outside it")]
    Cycle { list: ListId, candidate: ItemId },

    #[error("Unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForestError {
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        ForestError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ForestError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ForestError>;
