mod terminal;

use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{Answer, ChoiceLabel, ParseIdError, Question, QuestionDraft, QuestionId};
use quiz_core::time::format_countdown;
use services::{AdvancePolicy, AppServices, Clock};
use storage::documents::{decode_questions, encode_questions};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidTimer { raw: String },
    InvalidQuestionId(ParseIdError),
    InvalidChoice { raw: String },
    InvalidAnswer { raw: String },
    EditFlagWithoutEdit { flag: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTimer { raw } => {
                write!(f, "invalid timer: {raw} (expected whole seconds > 0)")
            }
            ArgsError::InvalidQuestionId(err) => write!(f, "{err}"),
            ArgsError::InvalidChoice { raw } => {
                write!(f, "invalid --choice: {raw} (expected LABEL=text)")
            }
            ArgsError::InvalidAnswer { raw } => {
                write!(f, "invalid --answer: {raw} (expected labels such as A or A,C)")
            }
            ArgsError::EditFlagWithoutEdit { flag } => {
                write!(f, "{flag} is only valid with add or edit")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [play]               [--db <sqlite_url>] [--shuffle]");
    eprintln!("  quiz preview              [--db <sqlite_url>] [--shuffle]");
    eprintln!("  quiz list                 [--db <sqlite_url>]");
    eprintln!("  quiz stats                [--db <sqlite_url>]");
    eprintln!("  quiz set-timer <seconds>  [--db <sqlite_url>]");
    eprintln!("  quiz add <prompt> --choice A=<text>... --answer <labels> [--db <sqlite_url>]");
    eprintln!("  quiz edit <id> [--prompt <text>] [--choice L=<text>]... [--answer <labels>]");
    eprintln!("  quiz delete <id>          [--db <sqlite_url>]");
    eprintln!("  quiz export               [--db <sqlite_url>]");
    eprintln!("  quiz import <file.json>   [--db <sqlite_url>]");
    eprintln!();
    eprintln!("play requires an answer before moving on; preview lets you skip.");
    eprintln!("--answer takes one label, or several separated by commas for multi-answer.");
    eprintln!("On edit, --choice replaces that label's text or appends a new label.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_LOG (error|warn|info|debug|trace, default warn)");
}

/// Field changes collected from `--prompt`, `--choice` and `--answer`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct QuestionEdit {
    prompt: Option<String>,
    choices: Vec<(ChoiceLabel, String)>,
    answer: Option<Answer>,
}

impl QuestionEdit {
    fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            prompt: self.prompt.unwrap_or_default(),
            choices: self.choices.into_iter().collect(),
            answer: self.answer,
            ..QuestionDraft::default()
        }
    }

    fn apply_to(self, question: &mut Question) {
        if let Some(prompt) = self.prompt {
            question.prompt = prompt.trim().to_string();
        }
        for (label, text) in self.choices {
            question.choices.insert(label, text);
        }
        if let Some(answer) = self.answer {
            question.answer = answer;
        }
    }
}

fn parse_choice(raw: String) -> Result<(ChoiceLabel, String), ArgsError> {
    let choice = raw
        .split_once('=')
        .map(|(label, text)| (label.trim(), text.trim()))
        .filter(|(label, text)| !label.is_empty() && !text.is_empty())
        .map(|(label, text)| (ChoiceLabel::new(label), text.to_string()));
    choice.ok_or(ArgsError::InvalidChoice { raw })
}

fn parse_answer(raw: String) -> Result<Answer, ArgsError> {
    let labels: Vec<ChoiceLabel> = raw
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(ChoiceLabel::new)
        .collect();
    match <[ChoiceLabel; 1]>::try_from(labels) {
        Ok([label]) => Ok(Answer::single(label)),
        Err(labels) if labels.is_empty() => Err(ArgsError::InvalidAnswer { raw }),
        Err(labels) => Ok(Answer::multiple(labels)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Play,
    Preview,
    List,
    Stats,
    SetTimer(u32),
    Add(QuestionEdit),
    Edit(QuestionId, QuestionEdit),
    Delete(QuestionId),
    Export,
    Import(PathBuf),
    Help,
}

impl Command {
    fn parse(word: &str, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        Ok(match word {
            "play" => Self::Play,
            "preview" => Self::Preview,
            "list" => Self::List,
            "stats" => Self::Stats,
            "export" => Self::Export,
            "set-timer" => {
                let raw = require_value(args, "set-timer")?;
                match raw.trim().parse::<u32>() {
                    Ok(seconds) if seconds > 0 => Self::SetTimer(seconds),
                    _ => return Err(ArgsError::InvalidTimer { raw }),
                }
            }
            "add" => Self::Add(QuestionEdit {
                prompt: Some(require_value(args, "add")?),
                ..QuestionEdit::default()
            }),
            "edit" => {
                let raw = require_value(args, "edit")?;
                Self::Edit(
                    raw.parse().map_err(ArgsError::InvalidQuestionId)?,
                    QuestionEdit::default(),
                )
            }
            "delete" => {
                let raw = require_value(args, "delete")?;
                Self::Delete(raw.parse().map_err(ArgsError::InvalidQuestionId)?)
            }
            "import" => Self::Import(PathBuf::from(require_value(args, "import")?)),
            _ => return Err(ArgsError::UnknownArg(word.to_string())),
        })
    }

    fn edit_mut(&mut self) -> Option<&mut QuestionEdit> {
        match self {
            Self::Add(edit) | Self::Edit(_, edit) => Some(edit),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    shuffle: bool,
    command: Command,
}

impl Args {
    fn parse(
        args: impl IntoIterator<Item = String>,
        env_db_url: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        let mut db_url = env_db_url.map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut shuffle = false;
        let mut command = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--shuffle" => shuffle = true,
                "--prompt" | "--choice" | "--answer" => {
                    let flag = match arg.as_str() {
                        "--prompt" => "--prompt",
                        "--choice" => "--choice",
                        _ => "--answer",
                    };
                    let edit = command
                        .as_mut()
                        .and_then(Command::edit_mut)
                        .ok_or(ArgsError::EditFlagWithoutEdit { flag })?;
                    let value = require_value(&mut args, flag)?;
                    match flag {
                        "--prompt" => edit.prompt = Some(value),
                        "--choice" => edit.choices.push(parse_choice(value)?),
                        _ => edit.answer = Some(parse_answer(value)?),
                    }
                }
                "--help" | "-h" | "help" => command = Some(Command::Help),
                word if command.is_none() && !word.starts_with('-') => {
                    command = Some(Command::parse(word, &mut args)?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            shuffle,
            command: command.unwrap_or(Command::Play),
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim().to_string();
    if trimmed == "sqlite::memory:"
        || trimmed.starts_with("sqlite://")
        || trimmed.contains("mode=memory")
    {
        return trimmed;
    }

    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let level = std::env::var("QUIZ_LOG")
        .ok()
        .and_then(|raw| raw.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::WARN);

    // stdout belongs to the quiz itself.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let args = Args::parse(std::env::args().skip(1), std::env::var("QUIZ_DB_URL").ok())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    debug!(db_url = %args.db_url, "opening quiz database");
    let services = AppServices::new_sqlite(&args.db_url, Clock::system(), args.shuffle).await?;
    let store = services.store();

    match args.command {
        Command::Play => play(&services, AdvancePolicy::guided()).await?,
        Command::Preview => play(&services, AdvancePolicy::free()).await?,
        Command::List => {
            for question in store.load_questions().await {
                println!("#{} {}", question.id, question.prompt);
                for (label, text) in &question.choices {
                    println!("    {label}) {text}");
                }
                println!("    answer: {}", question.answer);
            }
        }
        Command::Stats => {
            let config = store.load_config().await;
            println!("Timer: {}", format_countdown(config.timer_seconds()));
            println!("Highest score: {}%", config.highest_score());
        }
        Command::SetTimer(seconds) => {
            store.save_timer_seconds(seconds).await?;
            println!("Timer set to {}", format_countdown(seconds));
        }
        Command::Add(edit) => {
            let question = store.add_question(edit.into_draft()).await?;
            println!("Added question {}", question.id);
        }
        Command::Edit(id, edit) => {
            let mut question = store.question(id).await?;
            edit.apply_to(&mut question);
            store.update_question(question).await?;
            println!("Updated question {id}");
        }
        Command::Delete(id) => {
            store.delete_question(id).await?;
            println!("Deleted question {id}");
        }
        Command::Export => {
            let questions = store.load_questions().await;
            println!("{}", encode_questions(&questions)?);
        }
        Command::Import(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let questions = decode_questions(&raw)?;
            store.save_questions(&questions).await?;
            info!(count = questions.len(), path = %path.display(), "question bank imported");
            println!("Imported {} questions", questions.len());
        }
        Command::Help => print_usage(),
    }

    Ok(())
}

async fn play(
    services: &AppServices,
    policy: AdvancePolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let quiz_loop = services.quiz_loop();
    let mut lines = terminal::stdin_lines();
    loop {
        let Some(outcome) = terminal::play(&quiz_loop, policy, &mut lines).await? else {
            println!("Quiz abandoned.");
            return Ok(());
        };
        terminal::print_outcome(&outcome);
        if !terminal::confirm("Retake the quiz?", &mut lines).await? {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(|s| (*s).to_string()), None)
    }

    #[test]
    fn no_arguments_plays_against_default_db() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.command, Command::Play);
        assert_eq!(args.db_url, DEFAULT_DB_URL);
        assert!(!args.shuffle);
    }

    #[test]
    fn flags_may_precede_or_follow_command() {
        let args = parse(&["--shuffle", "preview", "--db", "sqlite::memory:"]).unwrap();
        assert_eq!(args.command, Command::Preview);
        assert_eq!(args.db_url, "sqlite::memory:");
        assert!(args.shuffle);
    }

    #[test]
    fn env_db_url_is_overridden_by_flag() {
        let args = Args::parse(
            ["--db".to_string(), "sqlite::memory:".to_string()],
            Some("sqlite:///tmp/env.sqlite3".to_string()),
        )
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");

        let args = Args::parse(Vec::new(), Some("sqlite:///tmp/env.sqlite3".to_string())).unwrap();
        assert_eq!(args.db_url, "sqlite:///tmp/env.sqlite3");
    }

    #[test]
    fn set_timer_requires_positive_seconds() {
        assert_eq!(parse(&["set-timer", "90"]).unwrap().command, Command::SetTimer(90));
        assert!(matches!(
            parse(&["set-timer", "0"]),
            Err(ArgsError::InvalidTimer { .. })
        ));
        assert!(matches!(
            parse(&["set-timer"]),
            Err(ArgsError::MissingValue { flag: "set-timer" })
        ));
    }

    #[test]
    fn delete_parses_question_id() {
        assert_eq!(
            parse(&["delete", "3"]).unwrap().command,
            Command::Delete(QuestionId::new(3))
        );
        assert!(matches!(
            parse(&["delete", "three"]),
            Err(ArgsError::InvalidQuestionId(_))
        ));
    }

    #[test]
    fn add_collects_choices_and_answer() {
        let args = parse(&[
            "add",
            "Largest planet?",
            "--choice",
            "A=Mars",
            "--choice",
            "B = Jupiter",
            "--answer",
            "B",
            "--db",
            "sqlite::memory:",
        ])
        .unwrap();
        let Command::Add(edit) = args.command else {
            panic!("expected add, got {:?}", args.command);
        };
        let draft = edit.into_draft();
        assert_eq!(draft.prompt, "Largest planet?");
        assert_eq!(draft.choices.len(), 2);
        assert_eq!(draft.choices[&ChoiceLabel::new("B")], "Jupiter");
        assert_eq!(draft.answer, Some(Answer::single("B")));

        let question = draft.assign_id(QuestionId::new(5)).unwrap();
        assert_eq!(question.id, QuestionId::new(5));
    }

    #[test]
    fn edit_changes_only_named_fields() {
        let args = parse(&["edit", "2", "--choice", "E=Pluto", "--answer", "A, E"]).unwrap();
        let Command::Edit(id, edit) = args.command else {
            panic!("expected edit, got {:?}", args.command);
        };
        assert_eq!(id, QuestionId::new(2));

        let mut question = quiz_core::defaults::default_questions().remove(1);
        let prompt = question.prompt.clone();
        edit.apply_to(&mut question);
        assert_eq!(question.prompt, prompt);
        assert_eq!(question.choices.len(), 5);
        assert_eq!(question.answer, Answer::multiple(["A", "E"]));
        assert!(question.validate().is_ok());
    }

    #[test]
    fn edit_flags_need_an_add_or_edit_command() {
        assert!(matches!(
            parse(&["--answer", "A"]),
            Err(ArgsError::EditFlagWithoutEdit { flag: "--answer" })
        ));
        assert!(matches!(
            parse(&["list", "--prompt", "x"]),
            Err(ArgsError::EditFlagWithoutEdit { flag: "--prompt" })
        ));
        assert!(matches!(
            parse(&["add", "Q?", "--choice", "Paris"]),
            Err(ArgsError::InvalidChoice { .. })
        ));
        assert!(matches!(
            parse(&["edit", "1", "--answer", " , "]),
            Err(ArgsError::InvalidAnswer { .. })
        ));
        assert!(matches!(
            parse(&["add"]),
            Err(ArgsError::MissingValue { flag: "add" })
        ));
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        assert!(matches!(parse(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(parse(&["play", "list"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/quiz.sqlite3".to_string());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
    }
}
