//! User registration and login.
use crate::bank::MAX_FIELD_LEN;
use crate::error::{QuizError, Result};
use crate::store::Store;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use rusqlite::{params, OptionalExtension};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(plain.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(plain: &str, hashed: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hashed)?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

pub fn user_exists(store: &Store, username: &str) -> Result<bool> {
    let found = store
        .conn()
        .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            [username.trim()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Creates an account. An empty hint is stored as no hint.
pub fn register(
    store: &Store,
    username: &str,
    password: &str,
    hint: Option<&str>,
) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(QuizError::Validation("Username cannot be empty.".to_string()));
    }
    if username.chars().count() > MAX_FIELD_LEN {
        return Err(QuizError::Validation(format!(
            "Username must be at most {} characters.",
            MAX_FIELD_LEN
        )));
    }
    if password.is_empty() {
        return Err(QuizError::Validation("Password cannot be empty.".to_string()));
    }
    if user_exists(store, username)? {
        return Err(QuizError::UserExists(username.to_string()));
    }

    let hint = hint.map(str::trim).filter(|h| !h.is_empty());
    let hash = hash_password(password)?;
    store.conn().execute(
        "INSERT INTO users (username, password_hash, hint) VALUES (?1, ?2, ?3)",
        params![username, hash, hint],
    )?;

    info!(username, "user registered");
    Ok(User {
        id: store.conn().last_insert_rowid(),
        username: username.to_string(),
    })
}

pub fn authenticate(store: &Store, username: &str, password: &str) -> Result<User> {
    let username = username.trim();
    let row: Option<(i64, String)> = store
        .conn()
        .query_row(
            "SELECT id, password_hash FROM users WHERE username = ?1",
            [username],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (id, hash) = row.ok_or_else(|| QuizError::UserNotFound(username.to_string()))?;
    if !verify_password(password, &hash)? {
        warn!(username, "failed login");
        return Err(QuizError::InvalidCredentials);
    }

    info!(username, "user logged in");
    Ok(User {
        id,
        username: username.to_string(),
    })
}

pub fn password_hint(store: &Store, username: &str) -> Result<Option<String>> {
    let hint: Option<Option<String>> = store
        .conn()
        .query_row(
            "SELECT hint FROM users WHERE username = ?1",
            [username.trim()],
            |row| row.get(0),
        )
        .optional()?;
    match hint {
        Some(hint) => Ok(hint),
        None => Err(QuizError::UserNotFound(username.trim().to_string())),
    }
}
