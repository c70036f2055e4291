//! SQLite connection and schema for users, topics, questions and scores.
use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

/// Path understood by SQLite as a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE CHECK (username <> ''),
        password_hash TEXT NOT NULL,
        hint TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS topics (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE CHECK (name <> ''),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS questions (
        id INTEGER PRIMARY KEY,
        topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
        difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 3),
        text TEXT NOT NULL CHECK (text <> ''),
        correct_answer TEXT NOT NULL CHECK (correct_answer <> ''),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_questions_topic_difficulty
        ON questions(topic_id, difficulty);
    CREATE TABLE IF NOT EXISTS wrong_answers (
        question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        text TEXT NOT NULL CHECK (text <> ''),
        PRIMARY KEY (question_id, position)
    );
    CREATE TABLE IF NOT EXISTS scores (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
        topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
        correct INTEGER NOT NULL CHECK (correct >= 0),
        rounds INTEGER NOT NULL CHECK (rounds > 0 AND correct <= rounds),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
";

/// Owns the single connection used for the lifetime of the process.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened quiz database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        debug!("schema ready");
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Number of rows in one of the quiz tables.
    pub fn count_rows(&self, table: Table) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

/// Fixed set of table names; identifiers are never built from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Topics,
    Questions,
    WrongAnswers,
    Scores,
}

impl Table {
    fn as_str(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Topics => "topics",
            Table::Questions => "questions",
            Table::WrongAnswers => "wrong_answers",
            Table::Scores => "scores",
        }
    }
}
