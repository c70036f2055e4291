//! Runtime settings loaded from the environment (and `.env`).
use crate::error::{QuizError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Default SQLite database file
pub const DEFAULT_DATABASE: &str = "quiz.sqlite";

/// Questions asked per round unless configured otherwise
pub const DEFAULT_ROUNDS: usize = 10;

/// Log filter used when neither `RUST_LOG` nor `QUIZ_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database: PathBuf,
    pub rounds: usize,
    pub seed: Option<u64>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            rounds: DEFAULT_ROUNDS,
            seed: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any variable source; unset variables keep their defaults.
    /// No range checks here; call [`Config::validate`] after applying overrides.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup("QUIZ_DATABASE").filter(|p| !p.trim().is_empty()) {
            config.database = PathBuf::from(path.trim());
        }
        if let Some(raw) = lookup("QUIZ_ROUNDS") {
            config.rounds = parse_var("QUIZ_ROUNDS", &raw)?;
        }
        if let Some(raw) = lookup("QUIZ_SEED") {
            config.seed = Some(parse_var("QUIZ_SEED", &raw)?);
        }
        if let Some(filter) = lookup("QUIZ_LOG").filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter.trim().to_string();
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(QuizError::Config(
                "Rounds per quiz must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| QuizError::Config(format!("Invalid value for {}: {}", name, e)))
}
