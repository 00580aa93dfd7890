use thiserror::Error;

/// Errors related to content items entering the queue.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content item is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid relevance score: {0}")]
    InvalidRelevance(f64),

    #[error("duplicate content id '{0}'")]
    Duplicate(String),

    #[error("failed to parse content: {0}")]
    Parse(String),
}

/// Errors from the personality registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("character '{0}' is already registered")]
    DuplicateCharacter(String),

    #[error("character '{0}' not found")]
    NotFound(String),

    #[error("invalid character id: {0}")]
    InvalidId(String),
}

/// Errors from parsing or validating `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("character '{0}' is defined more than once")]
    DuplicateCharacter(String),
}
