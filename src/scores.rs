//! Attempt history and leaderboards.
//!
//! Every finished quiz is stored as its own row; the views average the
//! per-attempt percentage rather than keeping a running total.
use crate::accounts;
use crate::bank::{display_name, Topic};
use crate::error::{QuizError, Result};
use crate::store::Store;
use rusqlite::params;
use tracing::info;

/// Share of correct answers as a percentage; zero rounds count as 0%.
pub fn percentage(correct: usize, rounds: usize) -> f64 {
    if rounds == 0 {
        return 0.0;
    }
    correct as f64 * 100.0 / rounds as f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicAverage {
    pub topic: String,
    pub average: f64,
    pub attempts: usize,
}

impl TopicAverage {
    pub fn topic_display(&self) -> String {
        display_name(&self.topic)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserTopicAverage {
    pub username: String,
    pub topic: String,
    pub average: f64,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Winner {
    pub username: String,
    pub average: f64,
    pub attempts: usize,
}

pub fn save_score(
    store: &Store,
    username: &str,
    topic: &Topic,
    correct: usize,
    rounds: usize,
) -> Result<()> {
    if rounds == 0 {
        return Err(QuizError::Validation(
            "Cannot save a score for zero rounds.".to_string(),
        ));
    }
    if correct > rounds {
        return Err(QuizError::Validation(format!(
            "Score {} is larger than the {} rounds played.",
            correct, rounds
        )));
    }
    if !accounts::user_exists(store, username)? {
        return Err(QuizError::UserNotFound(username.to_string()));
    }

    store.conn().execute(
        "INSERT INTO scores (username, topic_id, correct, rounds) VALUES (?1, ?2, ?3, ?4)",
        params![username, topic.id, correct as i64, rounds as i64],
    )?;
    info!(username, topic = %topic.name, correct, rounds, "score saved");
    Ok(())
}

/// Average percentage per topic for one user, best topic first.
pub fn user_averages(store: &Store, username: &str) -> Result<Vec<TopicAverage>> {
    let mut stmt = store.conn().prepare(
        "SELECT t.name, AVG(100.0 * s.correct / s.rounds) AS avg_pct, COUNT(*)
         FROM scores s
         JOIN topics t ON t.id = s.topic_id
         WHERE s.username = ?1
         GROUP BY t.id
         ORDER BY avg_pct DESC, t.name",
    )?;
    let rows = stmt.query_map([username], |row| {
        let attempts: i64 = row.get(2)?;
        Ok(TopicAverage {
            topic: row.get(0)?,
            average: row.get(1)?,
            attempts: attempts as usize,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn all_user_averages(store: &Store) -> Result<Vec<UserTopicAverage>> {
    let mut stmt = store.conn().prepare(
        "SELECT s.username, t.name, AVG(100.0 * s.correct / s.rounds) AS avg_pct, COUNT(*)
         FROM scores s
         JOIN topics t ON t.id = s.topic_id
         GROUP BY s.username, t.id
         ORDER BY avg_pct DESC, s.username, t.name",
    )?;
    let rows = stmt.query_map([], |row| {
        let attempts: i64 = row.get(3)?;
        Ok(UserTopicAverage {
            username: row.get(0)?,
            topic: row.get(1)?,
            average: row.get(2)?,
            attempts: attempts as usize,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Every user tied for the best overall average (compared at two decimals).
pub fn winners(store: &Store) -> Result<Vec<Winner>> {
    let mut stmt = store.conn().prepare(
        "SELECT username, AVG(100.0 * correct / rounds) AS avg_pct, COUNT(*)
         FROM scores
         GROUP BY username
         ORDER BY avg_pct DESC, username",
    )?;
    let rows = stmt.query_map([], |row| {
        let attempts: i64 = row.get(2)?;
        Ok(Winner {
            username: row.get(0)?,
            average: row.get(1)?,
            attempts: attempts as usize,
        })
    })?;

    let mut ranked = Vec::new();
    for row in rows {
        ranked.push(row?);
    }

    let Some(best) = ranked.first().map(|w| hundredths(w.average)) else {
        return Ok(Vec::new());
    };
    Ok(ranked
        .into_iter()
        .take_while(|w| hundredths(w.average) == best)
        .collect())
}

fn hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}
