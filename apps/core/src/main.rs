// IASC Assistant terminal front-end

use anyhow::{bail, Context};
use iasc_assistant_core::attachment::Attachment;
use iasc_assistant_core::backend::{ApiClient, ChatBackend, LocalBackend};
use iasc_assistant_core::brain::{Dataset, FaqAssistant, LanguagePreference, RandomPicker, RuleSet};
use iasc_assistant_core::config::{AppConfig, ChatMode};
use iasc_assistant_core::dashboard::{DashboardFilter, FeedbackFilter};
use iasc_assistant_core::fs_manager::PortablePathManager;
use iasc_assistant_core::preflight::run_preflight_checks;
use iasc_assistant_core::session::{ChatSession, ReplyKind};
use iasc_assistant_core::telemetry;
use iasc_assistant_core::transcript::{CsvLayout, Feedback, TranscriptStore};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

const HELP: &str = "\
Commands:
  :lang auto|en|ar        reply language
  :name NAME              your display name
  :program TEXT           your program
  :level TEXT             your level
  :mode local|api         answer locally or through the API
  :attach PATH            attach a text file to the next question
  :detach                 drop the pending attachment
  :up / :down / :unrate   rate the last answer or clear the rating
  :stats [all|none|up|down]
  :export json|csv|admin PATH
  :clear                  delete the chat log
  :health                 probe the API
  :quit";

/// A parsed input line.
#[derive(Debug, PartialEq)]
enum Command {
    Ask(String),
    Lang(LanguagePreference),
    Name(String),
    Program(String),
    Level(String),
    Mode(ChatMode),
    Attach(PathBuf),
    Detach,
    Feedback(Feedback),
    Stats(FeedbackFilter),
    Export(ExportFormat, PathBuf),
    Clear,
    Health,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExportFormat {
    Json,
    Csv(CsvLayout),
}

fn parse_command(line: &str) -> anyhow::Result<Command> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Command::Ask(line.to_string()));
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "lang" => Command::Lang(arg.parse().map_err(anyhow::Error::msg)?),
        "name" => Command::Name(arg.to_string()),
        "program" => Command::Program(arg.to_string()),
        "level" => Command::Level(arg.to_string()),
        "mode" => Command::Mode(arg.parse()?),
        "attach" if !arg.is_empty() => Command::Attach(PathBuf::from(arg)),
        "attach" => bail!("Usage: :attach PATH"),
        "detach" => Command::Detach,
        "up" => Command::Feedback(Feedback::Up),
        "down" => Command::Feedback(Feedback::Down),
        "unrate" => Command::Feedback(Feedback::None),
        "stats" => Command::Stats(arg.parse()?),
        "export" => {
            let Some((format, path)) = arg.split_once(char::is_whitespace) else {
                bail!("Usage: :export json|csv|admin PATH");
            };
            let format = match format {
                "json" => ExportFormat::Json,
                "csv" => ExportFormat::Csv(CsvLayout::Chat),
                "admin" => ExportFormat::Csv(CsvLayout::Admin),
                other => bail!("Unknown export format '{}'", other),
            };
            Command::Export(format, PathBuf::from(path.trim()))
        }
        "clear" => Command::Clear,
        "health" => Command::Health,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => bail!("Unknown command ':{}' (try :help)", other),
    };
    Ok(command)
}

fn build_session(config: &AppConfig) -> anyhow::Result<ChatSession> {
    // Invalid rule patterns are a startup error.
    let rules = RuleSet::builtin().context("Built-in rules failed to compile")?;

    let local: Option<Arc<dyn ChatBackend>> = match Dataset::load(&config.dataset_path) {
        Ok(dataset) => {
            let assistant = FaqAssistant::new(dataset, rules)
                .with_threshold(config.retrieval_threshold)
                .with_picker(RandomPicker::from_entropy());
            Some(Arc::new(LocalBackend::new(Arc::new(assistant))) as Arc<dyn ChatBackend>)
        }
        Err(e) => {
            error!("Dataset unavailable at {:?}: {}", config.dataset_path, e);
            None
        }
    };

    let remote: Option<Arc<dyn ChatBackend>> = match ApiClient::from_config(config) {
        Ok(client) => Some(Arc::new(client) as Arc<dyn ChatBackend>),
        Err(e) => {
            warn!("API mode disabled: {}", e);
            None
        }
    };

    let transcript = match TranscriptStore::open(&config.transcript_path) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Transcript logging disabled: {}", e);
            None
        }
    };

    let mut session = ChatSession::new(local, remote, transcript);
    session.set_mode(config.mode);
    Ok(session)
}

/// Bare file names go to the exports directory.
fn export_destination(paths: &PortablePathManager, requested: &Path) -> PathBuf {
    let is_bare = requested.is_relative()
        && requested.parent().map_or(true, |p| p.as_os_str().is_empty());
    if is_bare {
        paths.exports_dir().join(requested)
    } else {
        requested.to_path_buf()
    }
}

async fn handle(
    session: &mut ChatSession,
    config: &AppConfig,
    command: Command,
) -> anyhow::Result<bool> {
    match command {
        Command::Ask(question) => {
            if let Some(reply) = session.ask(&question).await? {
                println!("\n{}\n  [{}]", reply.text, reply.meta);
                if reply.kind == ReplyKind::Answered && !reply.suggestions.is_empty() {
                    println!("  Try: {}", reply.suggestions.join(" | "));
                }
                println!();
            }
        }
        Command::Lang(pref) => {
            session.set_preference(pref);
            println!("Reply language: {:?}", pref);
        }
        Command::Name(name) => {
            session.set_user_name(&name);
            println!("Name: {}", session.profile().name);
        }
        Command::Program(program) => session.set_program(&program),
        Command::Level(level) => session.set_level(&level),
        Command::Mode(mode) => {
            session.set_mode(mode);
            println!("Mode: {}", mode);
        }
        Command::Attach(path) => {
            let attachment = Attachment::load(&path, config.attachment_max_chars)?;
            println!(
                "Attached {} ({} chars{})",
                attachment.name,
                attachment.char_count(),
                if attachment.truncated { ", truncated" } else { "" }
            );
            session.attach(attachment);
        }
        Command::Detach => session.clear_attachment(),
        Command::Feedback(feedback) => {
            if session.feedback(feedback)? {
                println!("Thanks for the feedback.");
            } else {
                println!("Nothing to rate yet.");
            }
        }
        Command::Stats(feedback) => {
            let filter = DashboardFilter {
                feedback,
                ..Default::default()
            };
            print!("{}", session.dashboard(&filter)?);
        }
        Command::Export(format, path) => {
            let path = export_destination(&PortablePathManager::new(&config.home), &path);
            let count = match format {
                ExportFormat::Json => session.export_json(&path)?,
                ExportFormat::Csv(layout) => session.export_csv(&path, layout)?,
            };
            println!("Exported {} turns to {}", count, path.display());
        }
        Command::Clear => {
            session.clear_transcript()?;
            println!("Chat log cleared.");
        }
        Command::Health => {
            let client = ApiClient::from_config(config)?;
            let health = client.health().await;
            println!("{}", health.message);
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Invalid configuration")?;
    telemetry::init(config.log_format)?;

    info!("IASC Assistant starting (home: {:?})", config.home);
    PortablePathManager::new(&config.home)
        .init()
        .context("Failed to create data directories")?;
    let report = run_preflight_checks(&config).await;
    if !report.local_ready {
        warn!("{}", report.summary);
    }

    let mut session = build_session(&config)?;
    println!("IASC Assistant. Ask a question in English or Arabic, :help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        match handle(&mut session, &config, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("Error: {:#}", e),
        }
    }

    info!("Bye");
    Ok(())
}
