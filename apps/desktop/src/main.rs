use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    state::{with_query_param, GRADE_PARAM, SESSION_ID_PARAM, TOPIC_PARAM},
    view::{theme_label, Region},
    FilePreferences, HttpTutorClient, LearnPage, Location, MemoryLocation, PracticePage,
    SessionController, SessionsPage, ThemeController, TutorApi,
};
use shared::domain::{GradeLevel, Persona, SessionId, Theme};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

mod config;
mod terminal;

use config::{load_settings, Settings};
use terminal::{read_line, render_nodes, render_region, StdinPrompter};

const LEARN_PAGE_URL: &str = "http://learnbot.local/learn";

#[derive(Parser, Debug)]
#[command(name = "learnbot", about = "Terminal host for the LearnBot math tutor")]
struct Cli {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat with the tutor, optionally resuming a saved session.
    Chat(ChatArgs),
    /// Work through a set of practice problems.
    Practice {
        #[arg(long)]
        count: Option<usize>,
        #[arg(long)]
        mode: Option<String>,
    },
    /// Multiple-choice quiz on a topic.
    Quiz(LessonArgs),
    /// Step-by-step guided lesson on a topic.
    Guided(LessonArgs),
    /// List, open or delete past sessions.
    Sessions,
    /// Show or change the saved theme.
    Theme {
        #[arg(long, conflicts_with = "set")]
        toggle: bool,
        #[arg(long, value_parser = parse_theme)]
        set: Option<Theme>,
    },
}

#[derive(Args, Debug, Default)]
struct ChatArgs {
    #[arg(long)]
    session: Option<SessionId>,
    #[arg(long)]
    topic: Option<String>,
    #[arg(long)]
    grade: Option<GradeLevel>,
}

#[derive(Args, Debug)]
struct LessonArgs {
    topic: String,
    #[arg(long)]
    grade: Option<GradeLevel>,
}

fn parse_theme(raw: &str) -> Result<Theme, String> {
    Theme::from_label(raw).ok_or_else(|| format!("unknown theme '{raw}' (expected light or dark)"))
}

#[derive(Debug, PartialEq, Eq)]
enum ChatCommand {
    Quit,
    NewSession,
    Topics,
    Topic(String),
    Grade(GradeLevel),
    Steps(bool),
    Persona(Persona),
    Message(String),
    Unknown(String),
}

impl ChatCommand {
    fn parse(line: &str) -> Self {
        let Some(rest) = line.strip_prefix('/') else {
            return ChatCommand::Message(line.to_string());
        };
        let (name, arg) = rest
            .split_once(char::is_whitespace)
            .map(|(name, arg)| (name, arg.trim()))
            .unwrap_or((rest, ""));
        match (name, arg) {
            ("quit" | "exit", _) => ChatCommand::Quit,
            ("new", _) => ChatCommand::NewSession,
            ("topics", _) => ChatCommand::Topics,
            ("topic", topic) if !topic.is_empty() => ChatCommand::Topic(topic.to_string()),
            ("grade", grade) => match GradeLevel::from_label(grade) {
                Some(grade) => ChatCommand::Grade(grade),
                None => ChatCommand::Unknown(line.to_string()),
            },
            ("steps", "on") => ChatCommand::Steps(true),
            ("steps", "off") => ChatCommand::Steps(false),
            ("persona", persona) => match Persona::new(persona) {
                Some(persona) => ChatCommand::Persona(persona),
                None => ChatCommand::Unknown(line.to_string()),
            },
            _ => ChatCommand::Unknown(line.to_string()),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PracticeCommand {
    Check(usize, String),
    Hint(usize),
    NewSet,
    Quit,
    Unknown,
}

impl PracticeCommand {
    fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or("");
        let number = words.next().and_then(|n| n.parse::<usize>().ok());
        match (command, number) {
            ("check", Some(n)) => PracticeCommand::Check(n, words.collect::<Vec<_>>().join(" ")),
            ("hint", Some(n)) => PracticeCommand::Hint(n),
            ("new", _) => PracticeCommand::NewSet,
            ("quit" | "exit", _) => PracticeCommand::Quit,
            _ => PracticeCommand::Unknown,
        }
    }
}

/// `A`/`b`/`2` style choice picks, zero-based.
fn parse_choice(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<usize>() {
        return n.checked_sub(1);
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some(usize::from(c.to_ascii_uppercase() as u8 - b'A'))
        }
        _ => None,
    }
}

fn learn_url(args: &ChatArgs) -> Result<Url> {
    let mut url = Url::parse(LEARN_PAGE_URL).context("invalid learn page url")?;
    let session = args.session.map(|id| id.to_string());
    url = with_query_param(&url, SESSION_ID_PARAM, session.as_deref());
    url = with_query_param(&url, TOPIC_PARAM, args.topic.as_deref());
    url = with_query_param(&url, GRADE_PARAM, args.grade.map(GradeLevel::label));
    Ok(url)
}

fn prompt(text: &str) -> io::Result<()> {
    let mut out = io::stdout();
    write!(out, "{text}")?;
    out.flush()
}

fn show(region: &Region) -> io::Result<()> {
    render_region(&mut io::stdout(), region)
}

/// Prints the chat entries added since the last call.
fn show_new(region: &Region, shown: usize) -> io::Result<usize> {
    let start = if region.nodes.len() < shown { 0 } else { shown };
    render_nodes(&mut io::stdout(), &region.nodes[start..])?;
    Ok(region.nodes.len())
}

async fn run_chat(
    api: &dyn TutorApi,
    prefs: FilePreferences,
    location: MemoryLocation,
    input: &mut impl BufRead,
) -> Result<()> {
    let mut page = LearnPage::new(SessionController::resolve(location, prefs));
    page.open(api).await;
    let mut shown = show_new(page.chat(), 0)?;

    loop {
        prompt("> ")?;
        let Some(line) = read_line(input)? else {
            break;
        };
        match ChatCommand::parse(&line) {
            ChatCommand::Quit => break,
            ChatCommand::NewSession => {
                page.new_session(api).await;
                shown = 0;
            }
            ChatCommand::Topics => {
                for topic in page.topics() {
                    println!("  {topic}");
                }
            }
            ChatCommand::Topic(topic) => {
                page.select_topic(api, &topic).await;
            }
            ChatCommand::Grade(grade) => {
                page.set_grade_level(grade);
                println!("Grade set to {}", grade.label());
            }
            ChatCommand::Steps(on) => {
                page.set_step_mode(on);
                println!("Step-by-step mode {}", if on { "on" } else { "off" });
            }
            ChatCommand::Persona(persona) => page.set_persona(persona),
            ChatCommand::Message(text) => {
                page.send_message(api, &text).await;
            }
            ChatCommand::Unknown(raw) => println!("Unknown command: {raw}"),
        }
        shown = show_new(page.chat(), shown)?;
    }

    if let Some(id) = page.controller().session_id() {
        info!(%id, url = %page.controller().location().href(), "leaving chat");
    }
    Ok(())
}

async fn run_practice(
    api: &dyn TutorApi,
    settings: &Settings,
    count: usize,
    mode: String,
    input: &mut impl BufRead,
) -> Result<()> {
    let mut page = PracticePage::new().with_mode(mode);
    page.load_problems(api, count).await;
    show(page.problem_region())?;
    println!("Commands: check <n> <answer>, hint <n>, new, quit");

    loop {
        prompt("practice> ")?;
        let Some(line) = read_line(input)? else {
            break;
        };
        match PracticeCommand::parse(&line) {
            PracticeCommand::Check(n, answer) => {
                page.check_answer(api, n, &answer).await;
                if let Some(feedback) = page.problem_region().find(&format!("problem-{n}-feedback")) {
                    println!("{}", feedback.text);
                }
                show(page.stats_region())?;
            }
            PracticeCommand::Hint(n) => {
                page.request_hint(api, n).await;
                if let Some(hint) = page.problem_region().find(&format!("problem-{n}-hint-box")) {
                    println!("{}", hint.text);
                }
            }
            PracticeCommand::NewSet => {
                page.load_problems(api, settings.problem_count).await;
                show(page.problem_region())?;
            }
            PracticeCommand::Quit => break,
            PracticeCommand::Unknown => println!("Commands: check <n> <answer>, hint <n>, new, quit"),
        }
    }
    Ok(())
}

async fn run_quiz(
    api: &dyn TutorApi,
    topic: &str,
    grade: GradeLevel,
    input: &mut impl BufRead,
) -> Result<()> {
    let mut page = PracticePage::new();
    page.start_quiz(api, topic, grade).await;
    show(page.quiz_region())?;

    while page.quiz().is_some() {
        prompt("answer> ")?;
        let Some(line) = read_line(input)? else {
            break;
        };
        if matches!(line.as_str(), "quit" | "exit") {
            break;
        }
        let Some(choice) = parse_choice(&line) else {
            println!("Pick a letter like A or B.");
            continue;
        };
        page.answer_quiz(api, choice).await;
        show(page.quiz_feedback())?;
        show(page.quiz_region())?;
    }
    page.exit_quiz();
    Ok(())
}

async fn run_guided(
    api: &dyn TutorApi,
    topic: &str,
    grade: GradeLevel,
    input: &mut impl BufRead,
) -> Result<()> {
    let mut page = PracticePage::new();
    page.start_guided(api, topic, grade).await;
    show(page.guided_region())?;

    while page.guided_session().is_some() {
        prompt("step> ")?;
        let Some(line) = read_line(input)? else {
            break;
        };
        if matches!(line.as_str(), "quit" | "exit") {
            break;
        }
        if page.submit_guided(api, &line).await {
            show(page.guided_region())?;
        }
    }
    Ok(())
}

async fn run_sessions(
    api: &dyn TutorApi,
    prefs: FilePreferences,
    input: &mut impl BufRead,
) -> Result<()> {
    let mut page = SessionsPage::new();
    page.load(api).await;
    show(page.list())?;
    println!("Commands: open <id>, delete <id>, quit");

    loop {
        prompt("sessions> ")?;
        let Some(line) = read_line(input)? else {
            return Ok(());
        };
        let (command, id) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        let id = id.trim().parse::<SessionId>().ok();
        match (command, id) {
            ("open", Some(id)) => {
                let mut location = MemoryLocation::parse("http://learnbot.local/sessions")?;
                if page.open(id, &mut location) {
                    return run_chat(api, prefs, location, input).await;
                }
                println!("No session {id} in the list.");
            }
            ("delete", Some(id)) => {
                let mut prompter = StdinPrompter::new(&mut *input, io::stdout());
                if page.delete(api, id, &mut prompter).await {
                    show(page.list())?;
                }
            }
            ("quit" | "exit", _) => return Ok(()),
            _ => println!("Commands: open <id>, delete <id>, quit"),
        }
    }
}

fn run_theme(prefs: FilePreferences, toggle: bool, set: Option<Theme>) -> Result<()> {
    let mut theme = ThemeController::resolve(prefs, false);
    if toggle {
        theme.toggle()?;
    } else if let Some(next) = set {
        theme.set_theme(next)?;
    }
    println!("{}", theme_label(theme.theme()));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = Some(data_dir);
    }

    let data_dir = settings.data_dir()?;
    let prefs = FilePreferences::open_in(&data_dir)?;
    let api = HttpTutorClient::new(settings.server_url.clone());
    info!(server_url = %api.server_url(), data_dir = %data_dir.display(), "learnbot starting");

    let stdin = io::stdin();
    let mut input = stdin.lock();

    match cli.command {
        Command::Chat(args) => {
            let location = MemoryLocation::new(learn_url(&args)?);
            run_chat(&api, prefs, location, &mut input).await
        }
        Command::Practice { count, mode } => {
            let count = count.unwrap_or(settings.problem_count);
            let mode = mode.unwrap_or_else(|| settings.practice_mode.clone());
            run_practice(&api, &settings, count, mode, &mut input).await
        }
        Command::Quiz(lesson) => {
            let grade = lesson.grade.unwrap_or_else(|| saved_grade(prefs));
            run_quiz(&api, &lesson.topic, grade, &mut input).await
        }
        Command::Guided(lesson) => {
            let grade = lesson.grade.unwrap_or_else(|| saved_grade(prefs));
            run_guided(&api, &lesson.topic, grade, &mut input).await
        }
        Command::Sessions => run_sessions(&api, prefs, &mut input).await,
        Command::Theme { toggle, set } => run_theme(prefs, toggle, set),
    }
}

/// The grade a fresh learn page would start with.
fn saved_grade(prefs: FilePreferences) -> GradeLevel {
    match Url::parse(LEARN_PAGE_URL) {
        Ok(url) => SessionController::resolve(MemoryLocation::new(url), prefs)
            .state()
            .grade_level,
        Err(_) => GradeLevel::default(),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
