//! Starter question bank loaded into an empty database.
use crate::bank::{self, Difficulty, NewQuestion};
use crate::error::Result;
use crate::store::{Store, Table};
use tracing::info;

/// (difficulty, question, correct answer, wrong answers)
type Entry = (i64, &'static str, &'static str, [&'static str; 4]);

#[rustfmt::skip]
const LANGUAGES: &[Entry] = &[
    (1, "What is the official language of Brazil?", "Portuguese", ["Spanish", "French", "English", "Brazilian"]),
    (1, "Which language is spoken in Japan?", "Japanese", ["Chinese", "Korean", "Vietnamese", "Tagalog"]),
    (1, "Which language is widely spoken in India?", "Hindi", ["Bengali", "Marathi", "Gujarati", "Punjabi"]),
    (2, "What is the official language of the United Kingdom?", "English", ["Welsh", "Scots Gaelic", "Dutch", "French"]),
    (2, "Which language is primarily spoken in Colombia?", "Spanish", ["Portuguese", "Italian", "English", "Dutch"]),
    (2, "What is the official language of Argentina?", "Spanish", ["Portuguese", "English", "Italian", "German"]),
    (3, "Which language is primarily spoken in Iceland?", "Icelandic", ["Norwegian", "Danish", "Swedish", "Finnish"]),
    (3, "Which language is spoken in Finland?", "Finnish", ["Swedish", "Norwegian", "Danish", "Estonian"]),
];

#[rustfmt::skip]
const HISTORY: &[Entry] = &[
    (1, "Who was the first president of the United States?", "George Washington", ["Abraham Lincoln", "Thomas Jefferson", "Andrew Jackson", "John Adams"]),
    (1, "Who was the first emperor of Rome?", "Augustus", ["Julius Caesar", "Nero", "Tiberius", "Caligula"]),
    (2, "In which year did World War II end?", "1945", ["1939", "1918", "1965", "1950"]),
    (2, "Who was the first man to walk on the moon?", "Neil Armstrong", ["Buzz Aldrin", "Yuri Gagarin", "Michael Collins", "John Glenn"]),
    (3, "Which country was formerly known as Persia?", "Iran", ["Iraq", "Afghanistan", "Syria", "Turkey"]),
    (3, "Who was the first president of post-apartheid South Africa?", "Nelson Mandela", ["Thabo Mbeki", "Jacob Zuma", "F.W. de Klerk", "Hendrik Verwoerd"]),
    (3, "In which year did the Titanic sink?", "1912", ["1905", "1898", "1923", "1910"]),
];

#[rustfmt::skip]
const LITERATURE: &[Entry] = &[
    (1, "Who wrote 'To Kill a Mockingbird'?", "Harper Lee", ["Mark Twain", "Jane Austen", "F. Scott Fitzgerald", "J.K. Rowling"]),
    (1, "Which novel features Sherlock Holmes?", "The Hound of the Baskervilles", ["The Great Gatsby", "Pride and Prejudice", "Moby Dick", "1984"]),
    (1, "Who wrote '1984'?", "George Orwell", ["Aldous Huxley", "J.K. Rowling", "Charles Dickens", "Ernest Hemingway"]),
    (2, "In which year was 'Harry Potter and the Philosopher's Stone' published?", "1997", ["1995", "2000", "1999", "2005"]),
    (2, "Who is the author of 'The Catcher in the Rye'?", "J.D. Salinger", ["Ernest Hemingway", "F. Scott Fitzgerald", "Mark Twain", "John Steinbeck"]),
    (3, "Who wrote 'One Hundred Years of Solitude'?", "Gabriel García Márquez", ["Isabel Allende", "Mario Vargas Llosa", "Carlos Fuentes", "Jorge Luis Borges"]),
    (3, "Which novel is set during the American Civil War?", "Gone with the Wind", ["Moby Dick", "Pride and Prejudice", "War and Peace", "The Scarlet Letter"]),
    (3, "Who wrote 'Crime and Punishment'?", "Fyodor Dostoevsky", ["Leo Tolstoy", "Anton Chekhov", "Vladimir Nabokov", "Alexander Pushkin"]),
];

const STARTER_BANK: &[(&str, &[Entry])] = &[
    ("languages", LANGUAGES),
    ("history", HISTORY),
    ("literature", LITERATURE),
];

/// Loads the starter bank when no topics exist yet. Returns the number of questions added.
pub fn seed_if_empty(store: &Store) -> Result<usize> {
    if store.count_rows(Table::Topics)? > 0 {
        return Ok(0);
    }

    let mut added = 0;
    for (topic, entries) in STARTER_BANK {
        bank::add_topic(store, topic)?;
        for (level, text, correct, wrong) in entries.iter() {
            let Some(difficulty) = Difficulty::from_level(*level) else {
                continue;
            };
            bank::add_question(
                store,
                topic,
                NewQuestion {
                    difficulty,
                    text: text.to_string(),
                    correct_answer: correct.to_string(),
                    wrong_answers: wrong.iter().map(|w| w.to_string()).collect(),
                },
            )?;
            added += 1;
        }
    }

    info!(questions = added, "seeded starter question bank");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_once() {
        let store = Store::open_in_memory().unwrap();
        let added = seed_if_empty(&store).unwrap();
        assert_eq!(added, LANGUAGES.len() + HISTORY.len() + LITERATURE.len());
        assert_eq!(store.count_rows(Table::Topics).unwrap(), 3);

        assert_eq!(seed_if_empty(&store).unwrap(), 0);
        assert_eq!(store.count_rows(Table::Questions).unwrap(), added);
    }

    #[test]
    fn test_every_difficulty_is_covered() {
        let store = Store::open_in_memory().unwrap();
        seed_if_empty(&store).unwrap();
        for topic in bank::list_topics(&store).unwrap() {
            for difficulty in Difficulty::ALL {
                let n = bank::count_questions(&store, &topic, Some(difficulty)).unwrap();
                assert!(n >= 2, "{} has {} {:?} questions", topic.name, n, difficulty);
            }
        }
    }

    #[test]
    fn test_seed_skipped_when_topics_exist() {
        let store = Store::open_in_memory().unwrap();
        bank::add_topic(&store, "custom").unwrap();
        assert_eq!(seed_if_empty(&store).unwrap(), 0);
    }
}
