//! Interactive menu-driven session: login, quiz, topic management, scores.
use crate::accounts::{self, User};
use crate::bank::{self, Difficulty, NewQuestion, Topic, MAX_WRONG_ANSWERS};
use crate::console::Console;
use crate::error::{QuizError, Result};
use crate::round;
use crate::scores;
use crate::store::Store;
use rand::Rng;
use std::io::{BufRead, Write};
use tracing::debug;

const MENU: &str = "
=== Quiz Application ===
1. Take a quiz
2. Add new questions
3. View all topics
4. Delete topics
5. Display questions from a topic
6. Change user
7. My scores
8. Show all users' scores
9. Who is the winner
10. Exit";

/// Whether the session keeps going after an action.
enum Flow {
    Stay,
    Quit,
}

enum Welcome {
    LoggedIn(User),
    Retry,
    Quit,
}

enum MenuExit {
    ChangeUser,
    Quit,
}

/// Reply to a numbered or free-text pick.
enum Pick<T> {
    Chosen(T),
    Invalid,
    Quit,
}

pub struct Session<'a, R, W, G> {
    store: &'a Store,
    console: Console<R, W>,
    rng: G,
    rounds: usize,
}

impl<'a, R, W, G> Session<'a, R, W, G>
where
    R: BufRead,
    W: Write,
    G: Rng,
{
    pub fn new(store: &'a Store, console: Console<R, W>, rng: G, rounds: usize) -> Self {
        Self {
            store,
            console,
            rng,
            rounds,
        }
    }

    /// Runs until the user exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let user = match self.welcome()? {
                Welcome::LoggedIn(user) => user,
                Welcome::Retry => continue,
                Welcome::Quit => break,
            };
            match self.menu(&user)? {
                MenuExit::ChangeUser => continue,
                MenuExit::Quit => break,
            }
        }
        self.console.say("Exiting the application... Goodbye!")?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.console.into_output()
    }

    fn welcome(&mut self) -> Result<Welcome> {
        self.console.blank()?;
        self.console.say("=== Welcome to Quiz Master ===")?;
        self.console.say("1. Login")?;
        self.console.say("2. Register")?;
        self.console.say("3. Quit")?;

        let Some(choice) = self.console.prompt("Please select an option (1-3): ")? else {
            return Ok(Welcome::Quit);
        };
        let step = match choice.as_str() {
            "1" => self.login(),
            "2" => self.register(),
            "3" => return Ok(Welcome::Quit),
            _ => {
                self.console.say("Invalid choice. Please select 1, 2 or 3.")?;
                return Ok(Welcome::Retry);
            }
        };
        match step {
            Err(e) if e.is_recoverable() => {
                self.console.say(format!("Error: {e}"))?;
                Ok(Welcome::Retry)
            }
            other => other,
        }
    }

    fn login(&mut self) -> Result<Welcome> {
        let Some(username) = self.console.prompt("Enter your username: ")? else {
            return Ok(Welcome::Quit);
        };
        if !accounts::user_exists(self.store, &username)? {
            self.console
                .say(QuizError::UserNotFound(username).to_string())?;
            return Ok(Welcome::Retry);
        }
        self.login_as(&username)
    }

    fn login_as(&mut self, username: &str) -> Result<Welcome> {
        let Some(password) = self.console.prompt("Enter your password: ")? else {
            return Ok(Welcome::Quit);
        };

        match accounts::authenticate(self.store, username, &password) {
            Ok(user) => {
                self.console
                    .say(format!("Welcome back, {}!", user.username))?;
                Ok(Welcome::LoggedIn(user))
            }
            Err(QuizError::InvalidCredentials) => {
                self.console.say("Incorrect password. Please try again.")?;
                if let Some(hint) = accounts::password_hint(self.store, username)? {
                    match self
                        .console
                        .confirm("Would you like to see your password hint? (y/n): ")?
                    {
                        Some(true) => self
                            .console
                            .say(format!("Your password hint is: {hint}"))?,
                        Some(false) => {}
                        None => return Ok(Welcome::Quit),
                    }
                }
                Ok(Welcome::Retry)
            }
            Err(e) => Err(e),
        }
    }

    fn register(&mut self) -> Result<Welcome> {
        let Some(username) = self.console.prompt("Enter your desired username: ")? else {
            return Ok(Welcome::Quit);
        };

        if accounts::user_exists(self.store, &username)? {
            self.console
                .say(QuizError::UserExists(username.clone()).to_string())?;
            return match self
                .console
                .confirm("Would you like to log in with this username instead? (y/n): ")?
            {
                Some(true) => self.login_as(&username),
                Some(false) => {
                    self.console.say("Please choose a different username.")?;
                    Ok(Welcome::Retry)
                }
                None => Ok(Welcome::Quit),
            };
        }

        let Some(password) = self
            .console
            .prompt(&format!("Create a password for '{username}': "))?
        else {
            return Ok(Welcome::Quit);
        };
        let Some(hint) = self
            .console
            .prompt("Password hint (leave blank for none): ")?
        else {
            return Ok(Welcome::Quit);
        };

        let user = accounts::register(self.store, &username, &password, Some(&hint))?;
        self.console
            .say(format!("User '{}' registered successfully!", user.username))?;
        Ok(Welcome::LoggedIn(user))
    }

    fn menu(&mut self, user: &User) -> Result<MenuExit> {
        loop {
            self.console.say(MENU)?;
            let Some(choice) = self.console.prompt("Enter your choice: ")? else {
                return Ok(MenuExit::Quit);
            };
            debug!(username = %user.username, choice = %choice, "menu choice");

            let result = match choice.as_str() {
                "1" => self.take_quiz(user),
                "2" => self.add_new_question(),
                "3" => render_topics(&mut self.console, self.store).map(|_| Flow::Stay),
                "4" => self.delete_topic(),
                "5" => self.display_questions(),
                "6" => {
                    self.console.say("You have logged out successfully.")?;
                    return Ok(MenuExit::ChangeUser);
                }
                "7" => self.my_scores(user).map(|_| Flow::Stay),
                "8" => render_all_scores(&mut self.console, self.store).map(|_| Flow::Stay),
                "9" => render_winners(&mut self.console, self.store).map(|_| Flow::Stay),
                "10" => return Ok(MenuExit::Quit),
                _ => {
                    self.console
                        .say("Invalid choice. Please select a valid option.")?;
                    Ok(Flow::Stay)
                }
            };

            match result {
                Ok(Flow::Stay) => {}
                Ok(Flow::Quit) => return Ok(MenuExit::Quit),
                Err(e) if e.is_recoverable() => self.console.say(format!("Error: {e}"))?,
                Err(e) => return Err(e),
            }
        }
    }

    fn pick_topic(&mut self) -> Result<Pick<Topic>> {
        let topics = bank::list_topics(self.store)?;
        if topics.is_empty() {
            self.console.say("No topics available.")?;
            return Ok(Pick::Invalid);
        }

        self.console.blank()?;
        self.console.say("Available topics:")?;
        for (i, topic) in topics.iter().enumerate() {
            self.console
                .say(format!("{}. {}", i + 1, topic.display_name()))?;
        }

        let Some(reply) = self.console.prompt("Select a topic (enter number): ")? else {
            return Ok(Pick::Quit);
        };
        match reply
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| topics.get(i))
        {
            Some(topic) => Ok(Pick::Chosen(topic.clone())),
            None => {
                self.console
                    .say("Invalid choice. Please select a valid topic number.")?;
                Ok(Pick::Invalid)
            }
        }
    }

    fn pick_difficulty(&mut self) -> Result<Pick<Difficulty>> {
        let Some(reply) = self
            .console
            .prompt("Select difficulty level (1 - Easy, 2 - Medium, 3 - Hard): ")?
        else {
            return Ok(Pick::Quit);
        };
        match Difficulty::parse(&reply) {
            Some(difficulty) => Ok(Pick::Chosen(difficulty)),
            None => {
                self.console
                    .say("Invalid choice. Please choose a difficulty between 1 and 3.")?;
                Ok(Pick::Invalid)
            }
        }
    }

    fn take_quiz(&mut self, user: &User) -> Result<Flow> {
        let topic = match self.pick_topic()? {
            Pick::Chosen(topic) => topic,
            Pick::Invalid => return Ok(Flow::Stay),
            Pick::Quit => return Ok(Flow::Quit),
        };
        let difficulty = match self.pick_difficulty()? {
            Pick::Chosen(difficulty) => difficulty,
            Pick::Invalid => return Ok(Flow::Stay),
            Pick::Quit => return Ok(Flow::Quit),
        };

        round::run_quiz(
            self.store,
            &mut self.console,
            &user.username,
            &topic,
            difficulty,
            self.rounds,
            &mut self.rng,
        )?;
        Ok(Flow::Stay)
    }

    fn add_new_question(&mut self) -> Result<Flow> {
        render_topics(&mut self.console, self.store)?;

        let Some(mode) = self.console.prompt(
            "Enter 'choose' to add a question to an existing topic or 'create' to create a new topic: ",
        )?
        else {
            return Ok(Flow::Quit);
        };

        let topic = match mode.to_lowercase().as_str() {
            "choose" => {
                let Some(name) = self
                    .console
                    .prompt("Enter the name of the topic you want to add a question to: ")?
                else {
                    return Ok(Flow::Quit);
                };
                match bank::find_topic(self.store, &name)? {
                    Some(topic) => topic,
                    None => {
                        self.console.say(format!("'{name}' is not a valid topic."))?;
                        return Ok(Flow::Stay);
                    }
                }
            }
            "create" => {
                let Some(name) = self.console.prompt("Enter the name of the new topic: ")? else {
                    return Ok(Flow::Quit);
                };
                let topic = bank::add_topic(self.store, &name)?;
                self.console
                    .say(format!("Topic '{}' added successfully!", topic.display_name()))?;
                topic
            }
            _ => {
                self.console
                    .say("Invalid choice. Please enter 'choose' or 'create'.")?;
                return Ok(Flow::Stay);
            }
        };

        let difficulty = match self.pick_difficulty()? {
            Pick::Chosen(difficulty) => difficulty,
            Pick::Invalid => return Ok(Flow::Stay),
            Pick::Quit => return Ok(Flow::Quit),
        };
        let Some(text) = self.console.prompt("Enter the question: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(correct_answer) = self.console.prompt("Enter the correct answer: ")? else {
            return Ok(Flow::Quit);
        };

        let mut wrong_answers = Vec::new();
        for i in 1..=MAX_WRONG_ANSWERS {
            let Some(wrong) = self
                .console
                .prompt(&format!("Enter wrong answer {i} (blank to finish): "))?
            else {
                return Ok(Flow::Quit);
            };
            if wrong.is_empty() {
                break;
            }
            wrong_answers.push(wrong);
        }

        bank::add_question(
            self.store,
            &topic.name,
            NewQuestion {
                difficulty,
                text,
                correct_answer,
                wrong_answers,
            },
        )?;
        self.console.say(format!(
            "Question added to the topic '{}'.",
            topic.display_name()
        ))?;
        Ok(Flow::Stay)
    }

    fn delete_topic(&mut self) -> Result<Flow> {
        let topic = match self.pick_topic()? {
            Pick::Chosen(topic) => topic,
            Pick::Invalid => return Ok(Flow::Stay),
            Pick::Quit => return Ok(Flow::Quit),
        };

        let question = format!(
            "Are you sure you want to delete the topic '{}' with all questions? (y/n): ",
            topic.display_name()
        );
        match self.console.confirm(&question)? {
            Some(true) => {
                bank::delete_topic(self.store, &topic.name)?;
                self.console.say(format!(
                    "Topic '{}' and its questions and scores have been deleted.",
                    topic.display_name()
                ))?;
                render_topics(&mut self.console, self.store)?;
            }
            Some(false) => self.console.say("Topic deletion cancelled.")?,
            None => return Ok(Flow::Quit),
        }
        Ok(Flow::Stay)
    }

    fn display_questions(&mut self) -> Result<Flow> {
        let topic = match self.pick_topic()? {
            Pick::Chosen(topic) => topic,
            Pick::Invalid => return Ok(Flow::Stay),
            Pick::Quit => return Ok(Flow::Quit),
        };

        let questions = bank::questions_for(self.store, &topic, None)?;
        if questions.is_empty() {
            self.console.say(format!(
                "No questions found for the topic '{}'.",
                topic.display_name()
            ))?;
            return Ok(Flow::Stay);
        }

        self.console
            .say(format!("\nQuestions from topic: {}", topic.display_name()))?;
        for difficulty in Difficulty::ALL {
            let tier: Vec<_> = questions
                .iter()
                .filter(|q| q.difficulty == difficulty)
                .collect();
            if tier.is_empty() {
                continue;
            }
            self.console
                .say(format!("\n=== Difficulty {} ===", difficulty))?;
            for (i, question) in tier.iter().enumerate() {
                self.console.say(format!("Q{}: {}", i + 1, question.text))?;
                self.console.say("-".repeat(40))?;
            }
        }
        Ok(Flow::Stay)
    }

    fn my_scores(&mut self, user: &User) -> Result<()> {
        let averages = scores::user_averages(self.store, &user.username)?;
        if averages.is_empty() {
            self.console.say(format!(
                "No scores found for user '{}'. Take a quiz first!",
                user.username
            ))?;
            return Ok(());
        }

        self.console.say("\n=== Your Average Scores ===")?;
        for avg in averages {
            self.console.say(format!(
                "Topic: {} | Average: {:.2}% | Attempts: {}",
                avg.topic_display(),
                avg.average,
                avg.attempts
            ))?;
        }
        Ok(())
    }
}

/// Prints every topic with its question count.
pub fn render_topics<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    store: &Store,
) -> Result<()> {
    let summaries = bank::topic_summaries(store)?;
    if summaries.is_empty() {
        return console.say("No topics available.");
    }

    console.say("Available topics:")?;
    for (i, (topic, count)) in summaries.iter().enumerate() {
        console.say(format!(
            "{}. {} ({} question{})",
            i + 1,
            topic.display_name(),
            count,
            if *count == 1 { "" } else { "s" }
        ))?;
    }
    Ok(())
}

pub fn render_all_scores<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    store: &Store,
) -> Result<()> {
    let all = scores::all_user_averages(store)?;
    if all.is_empty() {
        return console.say("No user scores available.");
    }

    console.say("\n=== All User Scores ===")?;
    for row in all {
        console.say(format!(
            "{} | Topic: {} | Avg Score: {:.2}% | Attempts: {}",
            row.username,
            bank::display_name(&row.topic),
            row.average,
            row.attempts
        ))?;
    }
    Ok(())
}

pub fn render_winners<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    store: &Store,
) -> Result<()> {
    let winners = scores::winners(store)?;
    if winners.is_empty() {
        return console.say("No scores available to determine a winner.");
    }

    console.say("Top Winner(s):")?;
    for winner in winners {
        console.say(format!(
            "{} with an average score of {:.2}% over {} attempt{}",
            winner.username,
            winner.average,
            winner.attempts,
            if winner.attempts == 1 { "" } else { "s" }
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn run_script(store: &Store, script: &str) -> String {
        let console = Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
        let mut session = Session::new(store, console, StdRng::seed_from_u64(9), 3);
        session.run().unwrap();
        String::from_utf8(session.into_output()).unwrap()
    }

    #[test]
    fn test_register_and_exit() {
        let store = Store::open_in_memory().unwrap();
        let out = run_script(&store, "2\nann\npw\npet\n10\n");
        assert!(out.contains("User 'ann' registered successfully!"));
        assert!(out.contains("=== Quiz Application ==="));
        assert!(out.contains("Goodbye!"));
        assert!(accounts::user_exists(&store, "ann").unwrap());
    }

    #[test]
    fn test_register_existing_user_offers_login() {
        let store = Store::open_in_memory().unwrap();
        accounts::register(&store, "ann", "pw", None).unwrap();

        let out = run_script(&store, "2\nann\ny\npw\n10\n");
        assert!(out.contains("Username 'ann' already exists."));
        assert!(out.contains("Welcome back, ann!"));

        let out = run_script(&store, "2\nann\nn\n3\n");
        assert!(out.contains("Please choose a different username."));
        assert!(!out.contains("Welcome back"));
    }

    #[test]
    fn test_unknown_user_then_eof() {
        let store = Store::open_in_memory().unwrap();
        let out = run_script(&store, "1\nghost\n");
        assert!(out.contains("User 'ghost' not found. Please register first."));
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn test_wrong_password_offers_hint() {
        let store = Store::open_in_memory().unwrap();
        accounts::register(&store, "ann", "pw", Some("the usual")).unwrap();
        let out = run_script(&store, "1\nann\nbad\ny\n3\n");
        assert!(out.contains("Incorrect password."));
        assert!(out.contains("Your password hint is: the usual"));
    }

    #[test]
    fn test_quiz_round_records_score() {
        let store = Store::open_in_memory().unwrap();
        seed::seed_if_empty(&store).unwrap();
        accounts::register(&store, "ann", "pw", None).unwrap();

        // topics list alphabetically, so 1 is history; it has three hard questions
        let out = run_script(&store, "1\nann\npw\n1\n1\n3\n1\n1\n1\n10\n");
        assert!(out.contains("Round 3/3"));
        assert!(out.contains("Your final score after 3 rounds"));

        let averages = scores::user_averages(&store, "ann").unwrap();
        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].topic, "history");
    }

    #[test]
    fn test_create_topic_and_add_question() {
        let store = Store::open_in_memory().unwrap();
        accounts::register(&store, "ann", "pw", None).unwrap();
        let script = "1\nann\npw\n2\ncreate\nSpace Facts\n2\nClosest star?\nThe Sun\nSirius\nVega\n\n3\n10\n";
        let out = run_script(&store, script);
        assert!(out.contains("Topic 'Space Facts' added successfully!"));
        assert!(out.contains("Question added to the topic 'Space Facts'."));
        assert!(out.contains("1. Space Facts (1 question)"));
    }

    #[test]
    fn test_delete_topic_with_confirmation() {
        let store = Store::open_in_memory().unwrap();
        accounts::register(&store, "ann", "pw", None).unwrap();
        bank::add_topic(&store, "history").unwrap();
        let out = run_script(&store, "1\nann\npw\n4\n1\ny\n10\n");
        assert!(out.contains("Topic 'History' and its questions and scores have been deleted."));
        assert!(bank::list_topics(&store).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_menu_choice_and_change_user() {
        let store = Store::open_in_memory().unwrap();
        accounts::register(&store, "ann", "pw", None).unwrap();
        let out = run_script(&store, "1\nann\npw\n42\n6\n3\n");
        assert!(out.contains("Invalid choice. Please select a valid option."));
        assert!(out.contains("You have logged out successfully."));
    }

    #[test]
    fn test_winner_and_scores_views() {
        let store = Store::open_in_memory().unwrap();
        accounts::register(&store, "ann", "pw", None).unwrap();
        let topic = bank::add_topic(&store, "history").unwrap();
        scores::save_score(&store, "ann", &topic, 3, 4).unwrap();

        let out = run_script(&store, "1\nann\npw\n7\n8\n9\n10\n");
        assert!(out.contains("Topic: History | Average: 75.00% | Attempts: 1"));
        assert!(out.contains("ann | Topic: History | Avg Score: 75.00% | Attempts: 1"));
        assert!(out.contains("ann with an average score of 75.00% over 1 attempt"));
    }

    #[test]
    fn test_display_questions_grouped() {
        let store = Store::open_in_memory().unwrap();
        seed::seed_if_empty(&store).unwrap();
        accounts::register(&store, "ann", "pw", None).unwrap();
        let out = run_script(&store, "1\nann\npw\n5\n3\n10\n");
        assert!(out.contains("Questions from topic: Literature"));
        assert!(out.contains("=== Difficulty 1 (Easy) ==="));
        assert!(out.contains("=== Difficulty 3 (Hard) ==="));
    }
}
