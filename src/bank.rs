//! Topics and multiple-choice questions.
//!
//! Topic names are normalized before they touch the database so that
//! "General Knowledge", "general knowledge" and "general_knowledge" are the
//! same topic. Questions are drawn uniformly at random without replacement.
use crate::error::{QuizError, Result};
use crate::store::Store;
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Fewest wrong answers a question may carry
pub const MIN_WRONG_ANSWERS: usize = 2;

/// Most wrong answers a question may carry
pub const MAX_WRONG_ANSWERS: usize = 5;

/// Longest accepted question or answer text, in characters
pub const MAX_FIELD_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn level(self) -> i64 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Parses menu input: a level number or a label, case-insensitive.
    pub fn parse(input: &str) -> Option<Self> {
        let raw = input.trim();
        if let Ok(level) = raw.parse::<i64>() {
            return Self::from_level(level);
        }
        Self::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.level(), self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: i64,
    pub name: String,
}

impl Topic {
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub topic_id: i64,
    pub difficulty: Difficulty,
    pub text: String,
    pub correct_answer: String,
    pub wrong_answers: Vec<String>,
}

impl Question {
    /// The correct answer followed by every non-empty wrong answer.
    pub fn options(&self) -> Vec<String> {
        std::iter::once(self.correct_answer.clone())
            .chain(
                self.wrong_answers
                    .iter()
                    .filter(|w| !w.trim().is_empty())
                    .cloned(),
            )
            .collect()
    }
}

/// A question as entered by a user or read from an import file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub difficulty: Difficulty,
    pub text: String,
    pub correct_answer: String,
    pub wrong_answers: Vec<String>,
}

impl NewQuestion {
    /// Trims every field, drops blank wrong answers and checks the result.
    pub fn validated(self) -> Result<Self> {
        let text = self.text.trim().to_string();
        let correct_answer = self.correct_answer.trim().to_string();
        let wrong_answers: Vec<String> = self
            .wrong_answers
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();

        if text.is_empty() {
            return Err(invalid("Question text cannot be empty."));
        }
        if correct_answer.is_empty() {
            return Err(invalid("Correct answer cannot be empty."));
        }
        if wrong_answers.len() < MIN_WRONG_ANSWERS || wrong_answers.len() > MAX_WRONG_ANSWERS {
            return Err(invalid(&format!(
                "A question needs between {} and {} wrong answers (got {}).",
                MIN_WRONG_ANSWERS,
                MAX_WRONG_ANSWERS,
                wrong_answers.len()
            )));
        }
        if wrong_answers.iter().any(|w| w == &correct_answer) {
            return Err(invalid("A wrong answer repeats the correct answer."));
        }
        let distinct: HashSet<&str> = wrong_answers.iter().map(String::as_str).collect();
        if distinct.len() != wrong_answers.len() {
            return Err(invalid("Wrong answers must all be different."));
        }
        let too_long = std::iter::once(&text)
            .chain(std::iter::once(&correct_answer))
            .chain(wrong_answers.iter())
            .any(|field| field.chars().count() > MAX_FIELD_LEN);
        if too_long {
            return Err(invalid(&format!(
                "Question and answers must be at most {} characters.",
                MAX_FIELD_LEN
            )));
        }

        Ok(Self {
            difficulty: self.difficulty,
            text,
            correct_answer,
            wrong_answers,
        })
    }
}

fn invalid(msg: &str) -> QuizError {
    QuizError::Validation(msg.to_string())
}

/// Lowercases, trims and joins whitespace runs with underscores.
pub fn normalize_topic_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// "general_knowledge" -> "General Knowledge"
pub fn display_name(raw: &str) -> String {
    raw.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn insert_topic(conn: &Connection, normalized: &str) -> Result<Topic> {
    conn.execute("INSERT INTO topics (name) VALUES (?1)", [normalized])?;
    Ok(Topic {
        id: conn.last_insert_rowid(),
        name: normalized.to_string(),
    })
}

fn lookup_topic(conn: &Connection, normalized: &str) -> Result<Option<Topic>> {
    let topic = conn
        .query_row(
            "SELECT id, name FROM topics WHERE name = ?1",
            [normalized],
            |row| {
                Ok(Topic {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(topic)
}

fn check_topic_name(normalized: &str) -> Result<()> {
    if normalized.is_empty() {
        return Err(invalid("Topic name cannot be empty."));
    }
    if normalized.chars().count() > MAX_FIELD_LEN {
        return Err(invalid(&format!(
            "Topic name must be at most {} characters.",
            MAX_FIELD_LEN
        )));
    }
    Ok(())
}

pub fn add_topic(store: &Store, name: &str) -> Result<Topic> {
    let normalized = normalize_topic_name(name);
    check_topic_name(&normalized)?;
    if lookup_topic(store.conn(), &normalized)?.is_some() {
        return Err(QuizError::TopicExists(display_name(&normalized)));
    }
    let topic = insert_topic(store.conn(), &normalized)?;
    info!(topic = %topic.name, "topic added");
    Ok(topic)
}

pub fn find_topic(store: &Store, name: &str) -> Result<Option<Topic>> {
    lookup_topic(store.conn(), &normalize_topic_name(name))
}

pub fn list_topics(store: &Store) -> Result<Vec<Topic>> {
    let mut stmt = store
        .conn()
        .prepare("SELECT id, name FROM topics ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok(Topic {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;

    let mut topics = Vec::new();
    for topic in rows {
        topics.push(topic?);
    }
    Ok(topics)
}

/// Topics with their question counts, in listing order.
pub fn topic_summaries(store: &Store) -> Result<Vec<(Topic, usize)>> {
    let mut stmt = store.conn().prepare(
        "SELECT t.id, t.name, COUNT(q.id)
         FROM topics t
         LEFT JOIN questions q ON q.topic_id = t.id
         GROUP BY t.id
         ORDER BY t.name",
    )?;
    let rows = stmt.query_map([], |row| {
        let count: i64 = row.get(2)?;
        Ok((
            Topic {
                id: row.get(0)?,
                name: row.get(1)?,
            },
            count as usize,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Picks a topic by its 1-based position in `list_topics`.
pub fn topic_by_index(store: &Store, index: usize) -> Result<Option<Topic>> {
    if index == 0 {
        return Ok(None);
    }
    Ok(list_topics(store)?.into_iter().nth(index - 1))
}

/// Removes a topic along with its questions and scores.
pub fn delete_topic(store: &Store, name: &str) -> Result<Topic> {
    let normalized = normalize_topic_name(name);
    let tx = store.conn().unchecked_transaction()?;
    let topic = lookup_topic(&tx, &normalized)?
        .ok_or_else(|| QuizError::TopicNotFound(name.trim().to_string()))?;
    tx.execute("DELETE FROM topics WHERE id = ?1", [topic.id])?;
    tx.commit()?;

    info!(topic = %topic.name, "topic deleted");
    Ok(topic)
}

fn insert_question(conn: &Connection, topic_id: i64, question: &NewQuestion) -> Result<i64> {
    conn.execute(
        "INSERT INTO questions (topic_id, difficulty, text, correct_answer)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            topic_id,
            question.difficulty.level(),
            question.text,
            question.correct_answer
        ],
    )?;
    let question_id = conn.last_insert_rowid();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO wrong_answers (question_id, position, text) VALUES (?1, ?2, ?3)",
    )?;
    for (position, wrong) in question.wrong_answers.iter().enumerate() {
        stmt.execute(params![question_id, position as i64 + 1, wrong])?;
    }
    Ok(question_id)
}

pub fn add_question(store: &Store, topic_name: &str, question: NewQuestion) -> Result<Question> {
    let question = question.validated()?;
    let topic = find_topic(store, topic_name)?
        .ok_or_else(|| QuizError::TopicNotFound(topic_name.trim().to_string()))?;

    let tx = store.conn().unchecked_transaction()?;
    let id = insert_question(&tx, topic.id, &question)?;
    tx.commit()?;

    info!(topic = %topic.name, question_id = id, "question added");
    Ok(Question {
        id,
        topic_id: topic.id,
        difficulty: question.difficulty,
        text: question.text,
        correct_answer: question.correct_answer,
        wrong_answers: question.wrong_answers,
    })
}

fn wrong_answers_for(conn: &Connection, question_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT text FROM wrong_answers WHERE question_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map([question_id], |row| row.get(0))?;
    let mut out = Vec::new();
    for text in rows {
        out.push(text?);
    }
    Ok(out)
}

fn load_question(conn: &Connection, question_id: i64) -> Result<Question> {
    let (topic_id, level, text, correct_answer): (i64, i64, String, String) = conn.query_row(
        "SELECT topic_id, difficulty, text, correct_answer FROM questions WHERE id = ?1",
        [question_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;
    let difficulty = Difficulty::from_level(level)
        .ok_or_else(|| invalid(&format!("Stored difficulty {} is out of range.", level)))?;

    Ok(Question {
        id: question_id,
        topic_id,
        difficulty,
        text,
        correct_answer,
        wrong_answers: wrong_answers_for(conn, question_id)?,
    })
}

fn question_ids(
    conn: &Connection,
    topic: &Topic,
    difficulty: Option<Difficulty>,
) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM questions
         WHERE topic_id = ?1 AND (?2 IS NULL OR difficulty = ?2)
         ORDER BY difficulty, id",
    )?;
    let rows = stmt.query_map(params![topic.id, difficulty.map(Difficulty::level)], |row| {
        row.get(0)
    })?;
    let mut ids = Vec::new();
    for id in rows {
        ids.push(id?);
    }
    Ok(ids)
}

/// Every question of a topic, ordered by difficulty then insertion.
pub fn questions_for(
    store: &Store,
    topic: &Topic,
    difficulty: Option<Difficulty>,
) -> Result<Vec<Question>> {
    question_ids(store.conn(), topic, difficulty)?
        .into_iter()
        .map(|id| load_question(store.conn(), id))
        .collect()
}

pub fn count_questions(
    store: &Store,
    topic: &Topic,
    difficulty: Option<Difficulty>,
) -> Result<usize> {
    let n: i64 = store.conn().query_row(
        "SELECT COUNT(*) FROM questions WHERE topic_id = ?1 AND (?2 IS NULL OR difficulty = ?2)",
        params![topic.id, difficulty.map(Difficulty::level)],
        |row| row.get(0),
    )?;
    Ok(n as usize)
}

/// Draws `min(n, available)` distinct questions in random order.
pub fn draw_questions<R: Rng + ?Sized>(
    store: &Store,
    topic: &Topic,
    difficulty: Difficulty,
    n: usize,
    rng: &mut R,
) -> Result<Vec<Question>> {
    let ids = question_ids(store.conn(), topic, Some(difficulty))?;
    let mut picked: Vec<i64> = ids.choose_multiple(rng, n).copied().collect();
    picked.shuffle(rng);
    debug!(
        topic = %topic.name,
        difficulty = difficulty.level(),
        available = ids.len(),
        drawn = picked.len(),
        "drew questions"
    );

    picked
        .into_iter()
        .map(|id| load_question(store.conn(), id))
        .collect()
}

#[derive(Debug, Deserialize)]
struct ImportedQuestion {
    question: String,
    correct_answer: String,
    #[serde(default)]
    wrong_answers: Vec<Option<String>>,
    difficulty: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub topics_created: usize,
    pub inserted: usize,
    pub skipped: usize,
}

pub fn import_json(store: &Store, path: &Path) -> Result<ImportReport> {
    let raw = std::fs::read_to_string(path)?;
    let report = import_json_str(store, &raw)?;
    info!(
        path = %path.display(),
        topics_created = report.topics_created,
        inserted = report.inserted,
        skipped = report.skipped,
        "import finished"
    );
    Ok(report)
}

/// Imports `{"topic": [{question, correct_answer, wrong_answers, difficulty}]}`.
/// Invalid entries are skipped; everything else lands in one transaction.
pub fn import_json_str(store: &Store, raw: &str) -> Result<ImportReport> {
    let file: BTreeMap<String, Vec<ImportedQuestion>> = serde_json::from_str(raw)?;
    let mut report = ImportReport::default();

    let tx = store.conn().unchecked_transaction()?;
    for (name, entries) in file {
        let normalized = normalize_topic_name(&name);
        if let Err(e) = check_topic_name(&normalized) {
            warn!(error = %e, "skipping questions filed under a bad topic name");
            report.skipped += entries.len();
            continue;
        }
        // Created on the first valid entry so a fully skipped topic leaves nothing behind.
        let mut topic_id = lookup_topic(&tx, &normalized)?.map(|t| t.id);

        for entry in entries {
            let Some(difficulty) = Difficulty::from_level(entry.difficulty) else {
                warn!(
                    topic = %normalized,
                    difficulty = entry.difficulty,
                    "skipping question with bad difficulty"
                );
                report.skipped += 1;
                continue;
            };
            let candidate = NewQuestion {
                difficulty,
                text: entry.question,
                correct_answer: entry.correct_answer,
                wrong_answers: entry.wrong_answers.into_iter().flatten().collect(),
            };
            let question = match candidate.validated() {
                Ok(question) => question,
                Err(e) => {
                    warn!(topic = %normalized, error = %e, "skipping invalid question");
                    report.skipped += 1;
                    continue;
                }
            };
            let id = match topic_id {
                Some(id) => id,
                None => {
                    let id = insert_topic(&tx, &normalized)?.id;
                    report.topics_created += 1;
                    topic_id = Some(id);
                    id
                }
            };
            insert_question(&tx, id, &question)?;
            report.inserted += 1;
        }
    }
    tx.commit()?;
    Ok(report)
}
