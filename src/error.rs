//! Error type shared by every quiz operation.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuizError>;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Username '{0}' already exists.")]
    UserExists(String),

    #[error("User '{0}' not found. Please register first.")]
    UserNotFound(String),

    #[error("Incorrect password.")]
    InvalidCredentials,

    #[error("Topic '{0}' already exists.")]
    TopicExists(String),

    #[error("No topic found with name '{0}'.")]
    TopicNotFound(String),
}

impl QuizError {
    /// Domain errors are shown to the user and the session carries on.
    /// Storage, IO and setup failures are not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            QuizError::Database(_)
                | QuizError::Io(_)
                | QuizError::PasswordHash(_)
                | QuizError::Config(_)
        )
    }
}

impl From<argon2::password_hash::Error> for QuizError {
    fn from(err: argon2::password_hash::Error) -> Self {
        QuizError::PasswordHash(err.to_string())
    }
}
