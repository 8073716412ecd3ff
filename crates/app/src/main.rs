mod terminal;

use std::fmt;
use std::io;
use std::path::PathBuf;

use quiz_core::{Clock, ConfigError, ExtractorConfig};
use services::{QuizSession, load_questions, source_for_path};
use tracing::info;
use tracing_subscriber::EnvFilter;

use terminal::{Outcome, Terminal};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidMarker { raw: String, source: ConfigError },
    InvalidSeed { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidMarker { raw, source } => {
                write!(f, "invalid --marker value {raw:?}: {source}")
            }
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgsError::InvalidMarker { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run     [--file <path>] [--marker <char>] [--seed <u64>]");
    eprintln!("  cargo run -p app -- extract [--file <path>] [--marker <char>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --file quiz.pdf   (.pdf is read as PDF, anything else as plain text)");
    eprintln!("  --marker @");
    eprintln!("  --seed random");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_FILE, QUIZ_MARKER, QUIZ_SEED, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Extract,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "extract" => Some(Self::Extract),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    file: PathBuf,
    config: ExtractorConfig,
    seed: Option<u64>,
}

fn parse_marker(raw: String) -> Result<ExtractorConfig, ArgsError> {
    raw.parse()
        .map_err(|source| ArgsError::InvalidMarker { raw, source })
}

fn parse_seed(raw: String) -> Result<u64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidSeed { raw })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut file = std::env::var("QUIZ_FILE")
            .map_or_else(|_| PathBuf::from("quiz.pdf"), PathBuf::from);
        let mut config = match std::env::var("QUIZ_MARKER") {
            Ok(raw) => parse_marker(raw)?,
            Err(_) => ExtractorConfig::default(),
        };
        let mut seed = match std::env::var("QUIZ_SEED") {
            Ok(raw) => Some(parse_seed(raw)?),
            Err(_) => None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" => file = PathBuf::from(require_value(args, "--file")?),
                "--marker" => config = parse_marker(require_value(args, "--marker")?)?,
                "--seed" => seed = Some(parse_seed(require_value(args, "--seed")?)?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { file, config, seed })
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Splits the subcommand off `argv`. `None` means usage was requested.
/// Without a subcommand, or when the first argument is a flag, `run` is used.
fn split_command(mut argv: Vec<String>) -> Result<Option<(Command, Vec<String>)>, ArgsError> {
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => return Ok(None),
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => {
            Command::from_arg(first).ok_or_else(|| ArgsError::UnknownArg(first.to_string()))?
        }
    };

    if argv.first().is_some_and(|first| !first.starts_with("--")) {
        argv.remove(0);
    }
    Ok(Some((cmd, argv)))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    // Errors are printed by `main`; only the usage text is shown here.
    let Some((cmd, rest)) = split_command(argv).inspect_err(|_| print_usage())? else {
        print_usage();
        return Ok(());
    };
    let parsed = Args::parse(&mut rest.into_iter()).inspect_err(|_| print_usage())?;

    // No quiz without questions: an unreadable file or empty parse stops here.
    let source = source_for_path(&parsed.file);
    let questions = load_questions(source.as_ref(), &parsed.file, parsed.config)?;
    info!(
        file = %parsed.file.display(),
        questions = questions.len(),
        marker = %parsed.config.marker(),
        "quiz loaded"
    );

    match cmd {
        Command::Extract => {
            let json = serde_json::to_string_pretty(&questions)?;
            println!("{json}");
            Ok(())
        }
        Command::Run => {
            let mut session = match parsed.seed {
                Some(seed) => QuizSession::seeded(questions, seed, Clock::default())?,
                None => QuizSession::new(questions)?,
            };
            let stdin = io::stdin();
            let stdout = io::stdout();
            let outcome = Terminal::new(stdin.lock(), stdout.lock()).run(&mut session)?;
            match outcome {
                Outcome::Completed(score) => info!(
                    correct = score.correct,
                    valid_total = score.valid_total,
                    percentage = score.percentage,
                    "quiz completed"
                ),
                Outcome::Quit => info!(progress = ?session.progress(), "quiz abandoned"),
            }
            Ok(())
        }
    }
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
