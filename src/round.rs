//! The quiz round loop: draw questions, shuffle options, grade answers.
use crate::bank::{self, Difficulty, Question, Topic};
use crate::console::Console;
use crate::error::Result;
use crate::scores;
use crate::store::Store;
use rand::seq::SliceRandom;
use rand::Rng;
use std::io::{BufRead, Write};
use tracing::debug;

/// Result of a completed round. Skipped questions are not part of `answered`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    pub correct: usize,
    pub answered: usize,
    pub skipped: usize,
}

impl RoundOutcome {
    pub fn percentage(&self) -> f64 {
        scores::percentage(self.correct, self.answered)
    }
}

/// How a single reply was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Wrong,
    OutOfRange,
    NotANumber,
}

/// Options for one question in presentation order.
pub fn shuffled_options<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Vec<String> {
    let mut options = question.options();
    options.shuffle(rng);
    options
}

/// Maps a 1-based reply onto `options` and compares it with the correct answer.
pub fn grade(options: &[String], correct_answer: &str, reply: &str) -> Verdict {
    let Ok(choice) = reply.trim().parse::<usize>() else {
        return Verdict::NotANumber;
    };
    if choice == 0 || choice > options.len() {
        return Verdict::OutOfRange;
    }
    if options[choice - 1] == correct_answer {
        Verdict::Correct
    } else {
        Verdict::Wrong
    }
}

/// Asks each question once. Stops early if input runs out.
pub fn play<R, W, G>(
    console: &mut Console<R, W>,
    questions: &[Question],
    rng: &mut G,
) -> Result<RoundOutcome>
where
    R: BufRead,
    W: Write,
    G: Rng + ?Sized,
{
    let total = questions.len();
    let mut outcome = RoundOutcome::default();

    for (i, question) in questions.iter().enumerate() {
        let options = shuffled_options(question, rng);

        console.blank()?;
        console.say(format!("Round {}/{}", i + 1, total))?;
        console.say(format!("Question: {}", question.text))?;
        for (n, option) in options.iter().enumerate() {
            console.say(format!("{}. {}", n + 1, option))?;
        }

        let Some(reply) = console.prompt("Enter your answer: ")? else {
            console.say("Input closed. Ending the quiz early.")?;
            break;
        };

        match grade(&options, &question.correct_answer, &reply) {
            Verdict::Correct => {
                outcome.correct += 1;
                outcome.answered += 1;
                console.say("✓ Correct!")?;
            }
            Verdict::Wrong => {
                outcome.answered += 1;
                console.say(format!(
                    "✗ Incorrect. The correct answer was: {}",
                    question.correct_answer
                ))?;
            }
            Verdict::OutOfRange => {
                outcome.skipped += 1;
                console.say("Choice out of range. Skipping question.")?;
            }
            Verdict::NotANumber => {
                outcome.skipped += 1;
                console.say("Invalid input. Skipping question.")?;
            }
        }
    }

    Ok(outcome)
}

/// Draws, plays and records one quiz. Returns `None` when the topic has no
/// questions at that difficulty.
pub fn run_quiz<R, W, G>(
    store: &Store,
    console: &mut Console<R, W>,
    username: &str,
    topic: &Topic,
    difficulty: Difficulty,
    rounds: usize,
    rng: &mut G,
) -> Result<Option<RoundOutcome>>
where
    R: BufRead,
    W: Write,
    G: Rng + ?Sized,
{
    let questions = bank::draw_questions(store, topic, difficulty, rounds, rng)?;
    if questions.is_empty() {
        console.say(format!(
            "No questions available for '{}' at difficulty {}.",
            topic.display_name(),
            difficulty
        ))?;
        return Ok(None);
    }

    console.say(format!(
        "--- {} | {} | {} question{} ---",
        topic.display_name(),
        difficulty.label(),
        questions.len(),
        if questions.len() == 1 { "" } else { "s" }
    ))?;

    let outcome = play(console, &questions, rng)?;
    debug!(?outcome, "round finished");

    console.blank()?;
    if outcome.answered == 0 {
        console.say("No questions answered; score not saved.")?;
        return Ok(Some(outcome));
    }

    console.say(format!(
        "Your final score after {} round{}: {}/{} ({:.2}%)",
        outcome.answered,
        if outcome.answered == 1 { "" } else { "s" },
        outcome.correct,
        outcome.answered,
        outcome.percentage()
    ))?;
    if outcome.skipped > 0 {
        console.say(format!("Skipped: {}", outcome.skipped))?;
    }

    scores::save_score(store, username, topic, outcome.correct, outcome.answered)?;
    console.say("Score saved.")?;
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts;
    use crate::bank::NewQuestion;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn question(text: &str) -> Question {
        Question {
            id: 1,
            topic_id: 1,
            difficulty: Difficulty::Easy,
            text: text.to_string(),
            correct_answer: "Paris".to_string(),
            wrong_answers: vec!["Lyon".into(), "".into(), "Nice".into()],
        }
    }

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    /// Reply that picks the correct option for the given seed.
    fn correct_reply(q: &Question, seed: u64) -> String {
        let mut rng = StdRng::seed_from_u64(seed);
        let options = shuffled_options(q, &mut rng);
        let idx = options.iter().position(|o| o == &q.correct_answer).unwrap();
        (idx + 1).to_string()
    }

    #[test]
    fn test_options_are_a_permutation() {
        let q = question("Capital?");
        let mut rng = StdRng::seed_from_u64(3);
        let mut options = shuffled_options(&q, &mut rng);
        options.sort();
        assert_eq!(options, vec!["Lyon", "Nice", "Paris"]);
    }

    #[test]
    fn test_grade() {
        let options: Vec<String> = vec!["Lyon".into(), "Paris".into()];
        assert_eq!(grade(&options, "Paris", "2"), Verdict::Correct);
        assert_eq!(grade(&options, "Paris", " 1 "), Verdict::Wrong);
        assert_eq!(grade(&options, "Paris", "0"), Verdict::OutOfRange);
        assert_eq!(grade(&options, "Paris", "3"), Verdict::OutOfRange);
        assert_eq!(grade(&options, "Paris", "two"), Verdict::NotANumber);
        assert_eq!(grade(&options, "Paris", "-1"), Verdict::NotANumber);
    }

    #[test]
    fn test_invalid_input_is_skipped_without_penalty() {
        let q = question("Capital?");
        let mut c = console("abc\n9\n");
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = play(&mut c, &[q.clone(), q], &mut rng).unwrap();
        assert_eq!(
            outcome,
            RoundOutcome {
                correct: 0,
                answered: 0,
                skipped: 2
            }
        );
    }

    #[test]
    fn test_correct_answer_scores() {
        let q = question("Capital?");
        let reply = correct_reply(&q, 11);
        let mut c = console(&format!("{reply}\n"));
        let mut rng = StdRng::seed_from_u64(11);
        let outcome = play(&mut c, &[q], &mut rng).unwrap();
        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.answered, 1);
        assert_eq!(outcome.percentage(), 100.0);

        let out = String::from_utf8(c.into_output()).unwrap();
        assert!(out.contains("Round 1/1"));
        assert!(out.contains("Correct!"));
    }

    #[test]
    fn test_eof_ends_round_early() {
        let q = question("Capital?");
        let mut c = console("");
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = play(&mut c, &[q.clone(), q], &mut rng).unwrap();
        assert_eq!(outcome, RoundOutcome::default());
    }

    #[test]
    fn test_run_quiz_saves_answered_rounds_only() {
        let store = Store::open_in_memory().unwrap();
        accounts::register(&store, "ann", "pw", None).unwrap();
        let topic = bank::add_topic(&store, "geography").unwrap();
        bank::add_question(
            &store,
            "geography",
            NewQuestion {
                difficulty: Difficulty::Easy,
                text: "Capital of France?".into(),
                correct_answer: "Paris".into(),
                wrong_answers: vec!["Lyon".into(), "Nice".into()],
            },
        )
        .unwrap();

        // Any in-range reply counts as answered.
        let mut c = console("1\n");
        let mut rng = StdRng::seed_from_u64(2);
        let outcome = run_quiz(&store, &mut c, "ann", &topic, Difficulty::Easy, 10, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(outcome.answered, 1);

        let averages = scores::user_averages(&store, "ann").unwrap();
        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].attempts, 1);

        let mut c = console("x\n");
        run_quiz(&store, &mut c, "ann", &topic, Difficulty::Easy, 10, &mut rng).unwrap();
        let averages = scores::user_averages(&store, "ann").unwrap();
        assert_eq!(averages[0].attempts, 1);
    }

    #[test]
    fn test_run_quiz_without_questions() {
        let store = Store::open_in_memory().unwrap();
        let topic = bank::add_topic(&store, "empty").unwrap();
        let mut c = console("");
        let mut rng = StdRng::seed_from_u64(0);
        let res = run_quiz(&store, &mut c, "ann", &topic, Difficulty::Hard, 5, &mut rng).unwrap();
        assert!(res.is_none());
    }
}
