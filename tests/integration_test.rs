#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn quiz() -> Command {
    let mut cmd = Command::cargo_bin("quizmaster").unwrap();
    cmd.args(["--database", ":memory:", "--seed", "1"]);
    cmd
}

// Test that the program starts and shows welcome message
#[test]
fn test_program_starts() {
    quiz()
        .write_stdin("3\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to Quiz Master"))
        .stdout(predicate::str::contains("Goodbye!"));
}

// Closing stdin ends the session cleanly
#[test]
fn test_eof_exits_gracefully() {
    quiz()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Goodbye!"));
}

#[test]
fn test_invalid_welcome_choice() {
    quiz()
        .write_stdin("9\n3\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid choice. Please select 1, 2 or 3."));
}

// Register, then list the seeded topics
#[test]
fn test_register_and_view_topics() {
    quiz()
        .write_stdin("2\nann\npw\n\n3\n10\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("User 'ann' registered successfully!"))
        .stdout(predicate::str::contains("1. History (7 questions)"))
        .stdout(predicate::str::contains("3. Literature (8 questions)"));
}

#[test]
fn test_take_quiz_and_view_scores() {
    quiz()
        .args(["--rounds", "3"])
        .write_stdin("2\nann\npw\n\n1\n1\n3\n1\n1\n1\n7\n10\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Round 3/3"))
        .stdout(predicate::str::contains("Score saved."))
        .stdout(predicate::str::contains("Topic: History | Average:"));
}

#[test]
fn test_invalid_difficulty() {
    quiz()
        .write_stdin("2\nann\npw\n\n1\n1\n5\n10\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Invalid choice. Please choose a difficulty between 1 and 3.",
        ));
}

// Out-of-range and non-numeric answers skip the question
#[test]
fn test_skipped_answers_not_saved() {
    quiz()
        .args(["--rounds", "2"])
        .write_stdin("2\nann\npw\n\n1\n1\n1\nabc\n99\n7\n10\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid input. Skipping question."))
        .stdout(predicate::str::contains("Choice out of range. Skipping question."))
        .stdout(predicate::str::contains("No questions answered; score not saved."))
        .stdout(predicate::str::contains("No scores found for user 'ann'."));
}

#[test]
fn test_case_insensitive_choose_mode() {
    quiz()
        .write_stdin(concat!(
            "2\nann\npw\n\n",
            "2\nCHOOSE\nhistory\n1\n",
            "First emperor of China?\nQin Shi Huang\nLiu Bang\nKublai Khan\n\n",
            "3\n10\n"
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("Question added to the topic 'History'."))
        .stdout(predicate::str::contains("1. History (8 questions)"));
}

#[test]
fn test_init_subcommand() {
    quiz()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("23 starter questions added"));
}

#[test]
fn test_topics_subcommand() {
    quiz()
        .arg("topics")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. History (7 questions)"))
        .stdout(predicate::str::contains("2. Languages (8 questions)"));
}

#[test]
fn test_leaderboard_empty() {
    quiz()
        .arg("leaderboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("No user scores available."))
        .stdout(predicate::str::contains(
            "No scores available to determine a winner.",
        ));
}

#[test]
fn test_import_subcommand() {
    let path = std::env::temp_dir()
        .join(format!("quizmaster-import-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{"geography": [{"question": "Capital of Peru?", "correct_answer": "Lima",
            "wrong_answers": ["Quito", "Bogota"], "difficulty": 1}]}"#,
    )
    .unwrap();

    quiz()
        .arg("import")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 question(s)"))
        .stdout(predicate::str::contains("1 new topic(s), 0 skipped"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_zero_rounds_rejected() {
    quiz()
        .args(["--rounds", "0"])
        .write_stdin("3\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1"));
}

// Command-line flags take precedence over QUIZ_* variables
#[test]
fn test_cli_rounds_override_env() {
    quiz()
        .env("QUIZ_ROUNDS", "0")
        .args(["--rounds", "3"])
        .write_stdin("3\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Goodbye!"));
}
