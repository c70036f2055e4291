use clap::{Parser, Subcommand};
use quizmaster::{
    bank,
    config::Config,
    console::Console,
    seed,
    session::{self, Session},
    store::Store,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quizmaster", about = "Multiple-choice trivia quiz backed by SQLite")]
struct Cli {
    /// SQLite database file (`:memory:` for a throwaway database)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Questions per quiz round
    #[arg(long, global = true)]
    rounds: Option<usize>,

    /// Seed for reproducible question draws
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create the schema and load the starter questions
    Init {
        #[arg(long)]
        no_seed: bool,
    },
    /// Import questions from a JSON file
    Import { file: PathBuf },
    /// List topics with their question counts (seeding an empty database first)
    Topics,
    /// Show every user's averages and the current winners
    Leaderboard,
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(rounds) = cli.rounds {
        config.rounds = rounds;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;

    init_logging(&config.log_filter);
    let store = Store::open(&config.database)?;
    let mut console = Console::new(io::stdin().lock(), io::stdout().lock());

    match cli.command {
        None => {
            seed::seed_if_empty(&store)?;
            console.say("Welcome to Quiz Master (Rust / SQLite edition)")?;
            let rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            Session::new(&store, console, rng, config.rounds).run()?;
        }
        Some(Command::Init { no_seed }) => {
            let added = if no_seed {
                0
            } else {
                seed::seed_if_empty(&store)?
            };
            console.say(format!(
                "Database ready at {} ({} starter questions added).",
                config.database.display(),
                added
            ))?;
        }
        Some(Command::Import { file }) => {
            let report = bank::import_json(&store, &file)?;
            console.say(format!(
                "Imported {} question(s) from {}; {} new topic(s), {} skipped.",
                report.inserted,
                file.display(),
                report.topics_created,
                report.skipped
            ))?;
        }
        Some(Command::Topics) => {
            seed::seed_if_empty(&store)?;
            session::render_topics(&mut console, &store)?;
        }
        Some(Command::Leaderboard) => {
            session::render_all_scores(&mut console, &store)?;
            console.blank()?;
            session::render_winners(&mut console, &store)?;
        }
    }

    Ok(())
}
