//! Transcript Module
//!
//! Persists answered turns to a JSON-lines file (`chat_logs.jsonl`), one turn
//! per line. Lines starting with `#` are comments; lines that fail to parse are
//! skipped with a warning so a damaged file never blocks the assistant.
//!
//! Feedback updates rewrite the file; everything else appends.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ChatMode;
use crate::error::{AppError, Result};

/// Display name used when the user has not set one.
pub const DEFAULT_USER_NAME: &str = "Guest";

const HEADER: &str =
    "# IASC assistant transcript. Each line is a JSON object representing one turn";

/// Current time as an ISO-8601 UTC timestamp with milliseconds.
pub fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// User reaction to a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Feedback {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::None => "",
            Feedback::Up => "up",
            Feedback::Down => "down",
        }
    }
}

/// One logged exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub ts: String,
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_text: String,
    #[serde(default)]
    pub bot_text: String,
    #[serde(default)]
    pub tag: String,
    /// `rule`, `retrieval`, `fallback`, or whatever the remote API reported
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub mode: ChatMode,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub feedback: Feedback,
}

impl Turn {
    /// Name shown in statistics: blank names count as `Guest`.
    pub fn display_user(&self) -> &str {
        let name = self.user_name.trim();
        if name.is_empty() {
            DEFAULT_USER_NAME
        } else {
            name
        }
    }
}

/// Column order of a CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// Chat page export
    Chat,
    /// Admin dashboard export
    Admin,
}

impl CsvLayout {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            CsvLayout::Chat => &[
                "ts", "id", "lang", "source", "tag", "confidence", "mode", "userName", "program",
                "level", "feedback", "userText", "botText",
            ],
            CsvLayout::Admin => &[
                "ts", "id", "mode", "lang", "source", "tag", "confidence", "userName", "program",
                "level", "feedback", "userText", "botText",
            ],
        }
    }
}

fn column_value(turn: &Turn, column: &str) -> String {
    match column {
        "ts" => turn.ts.clone(),
        "id" => turn.id.clone(),
        "lang" => turn.lang.clone(),
        "source" => turn.source.clone(),
        "tag" => turn.tag.clone(),
        "confidence" => turn.confidence.to_string(),
        "mode" => turn.mode.as_str().to_string(),
        "userName" => turn.user_name.clone(),
        "program" => turn.program.clone(),
        "level" => turn.level.clone(),
        "feedback" => turn.feedback.as_str().to_string(),
        "userText" => turn.user_text.clone(),
        "botText" => turn.bot_text.clone(),
        _ => String::new(),
    }
}

fn csv_writer(buffer: Vec<u8>, quote_style: csv::QuoteStyle) -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .quote_style(quote_style)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buffer)
}

fn into_buffer(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.into_inner().map_err(|e| AppError::Io(e.into_error()))
}

/// CSV with a bare header row, then one row per turn with every field quoted.
/// Rows are separated by `\n`, with no trailing newline.
pub fn to_csv(turns: &[Turn], layout: CsvLayout) -> Result<String> {
    let columns = layout.columns();

    let mut header = csv_writer(Vec::new(), csv::QuoteStyle::Necessary);
    header.write_record(columns)?;

    let mut rows = csv_writer(into_buffer(header)?, csv::QuoteStyle::Always);
    for turn in turns {
        rows.write_record(columns.iter().map(|c| column_value(turn, c)))?;
    }

    let mut out = String::from_utf8(into_buffer(rows)?)
        .map_err(|e| AppError::Internal(format!("CSV export is not UTF-8: {}", e)))?;
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

/// Pretty-printed JSON array.
pub fn to_json(turns: &[Turn]) -> Result<String> {
    Ok(serde_json::to_string_pretty(turns)?)
}

/// JSON-lines transcript file.
#[derive(Debug)]
pub struct TranscriptStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TranscriptStore {
    /// Use `path`, creating its parent directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        info!("Transcript file: {:?}", path);
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append one turn.
    pub fn append(&self, turn: &Turn) -> Result<()> {
        let _guard = self.lock();
        let is_new = !self.path.exists();
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if is_new {
            writeln!(file, "{}", HEADER)?;
        }
        writeln!(file, "{}", serde_json::to_string(turn)?)?;
        debug!(id = %turn.id, tag = %turn.tag, "Turn appended to transcript");
        Ok(())
    }

    /// All turns, oldest first. A missing file is an empty transcript.
    pub fn load(&self) -> Result<Vec<Turn>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path)?;
        let mut turns = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match serde_json::from_str::<Turn>(trimmed) {
                Ok(turn) => turns.push(turn),
                Err(e) => warn!("Skipping unparsable transcript line {}: {}", number + 1, e),
            }
        }
        Ok(turns)
    }

    fn rewrite(&self, turns: &[Turn]) -> Result<()> {
        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            writeln!(file, "{}", HEADER)?;
            for turn in turns {
                writeln!(file, "{}", serde_json::to_string(turn)?)?;
            }
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Attach feedback to the newest turn whose id matches, or whose timestamp
    /// and reply text both match. Returns whether a turn was updated.
    pub fn set_feedback(
        &self,
        id: &str,
        ts: &str,
        bot_text: &str,
        feedback: Feedback,
    ) -> Result<bool> {
        let _guard = self.lock();
        let mut turns = self.load()?;
        let Some(turn) = turns
            .iter_mut()
            .rev()
            .find(|t| t.id == id || (t.ts == ts && t.bot_text == bot_text))
        else {
            return Ok(false);
        };
        turn.feedback = feedback;
        info!(id = %turn.id, feedback = feedback.as_str(), "Feedback recorded");
        self.rewrite(&turns)?;
        Ok(true)
    }

    /// Remove every logged turn.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Write all turns as a JSON array.
    pub fn export_json(&self, dest: &Path) -> Result<usize> {
        let turns = self.load()?;
        write_export(dest, &to_json(&turns)?)?;
        Ok(turns.len())
    }

    /// Write all turns as CSV.
    pub fn export_csv(&self, dest: &Path, layout: CsvLayout) -> Result<usize> {
        let turns = self.load()?;
        write_export(dest, &to_csv(&turns, layout)?)?;
        Ok(turns.len())
    }
}

fn write_export(dest: &Path, content: &str) -> Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, content).map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write export {:?}: {}", dest, e),
        ))
    })?;
    info!("Exported transcript to {:?}", dest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn turn(id: &str, bot_text: &str) -> Turn {
        Turn {
            ts: "2026-01-10T09:00:00.000Z".to_string(),
            id: id.to_string(),
            user_name: "Sara".to_string(),
            user_text: "hello".to_string(),
            bot_text: bot_text.to_string(),
            tag: "greeting".to_string(),
            source: "rule".to_string(),
            lang: "en".to_string(),
            confidence: 1.0,
            mode: ChatMode::Local,
            program: "CS".to_string(),
            level: "UG".to_string(),
            feedback: Feedback::None,
        }
    }

    #[test]
    fn test_append_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = TranscriptStore::open(temp_dir.path().join("logs/chat_logs.jsonl")).unwrap();
        assert!(store.load().unwrap().is_empty());

        store.append(&turn("a", "Hi!")).unwrap();
        store.append(&turn("b", "Hello again")).unwrap();

        let turns = store.load().unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].id, "a");
        assert_eq!(turns[1].bot_text, "Hello again");
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with('#'));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chat_logs.jsonl");
        let good = serde_json::to_string(&turn("ok", "fine")).unwrap();
        fs::write(&path, format!("# header\n\n{{broken\n{}\n", good)).unwrap();

        let store = TranscriptStore::open(&path).unwrap();
        let turns = store.load().unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].id, "ok");
    }

    #[test]
    fn test_missing_fields_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chat_logs.jsonl");
        fs::write(&path, "{\"ts\":\"t\",\"id\":\"x\"}\n").unwrap();
        let turns = TranscriptStore::open(&path).unwrap().load().unwrap();
        assert_eq!(turns[0].display_user(), "Guest");
        assert_eq!(turns[0].feedback, Feedback::None);
        assert_eq!(turns[0].mode, ChatMode::Local);
    }

    #[test]
    fn test_feedback_targets_newest_match() {
        let temp_dir = TempDir::new().unwrap();
        let store = TranscriptStore::open(temp_dir.path().join("chat_logs.jsonl")).unwrap();
        store.append(&turn("same", "first")).unwrap();
        store.append(&turn("same", "second")).unwrap();

        assert!(store.set_feedback("same", "", "", Feedback::Down).unwrap());
        let turns = store.load().unwrap();
        assert_eq!(turns[0].feedback, Feedback::None);
        assert_eq!(turns[1].feedback, Feedback::Down);

        // Match by timestamp + reply text when the id is unknown
        assert!(store
            .set_feedback("unknown", "2026-01-10T09:00:00.000Z", "first", Feedback::Up)
            .unwrap());
        assert_eq!(store.load().unwrap()[0].feedback, Feedback::Up);

        // Cleared
        assert!(store.set_feedback("same", "", "", Feedback::None).unwrap());
        assert_eq!(store.load().unwrap()[1].feedback, Feedback::None);

        assert!(!store.set_feedback("nope", "never", "none", Feedback::Up).unwrap());
    }

    #[test]
    fn test_csv_quoting_and_layouts() {
        let mut t = turn("id1", "He said \"hi\"\nthen left");
        t.confidence = 0.75;
        let csv = to_csv(&[t.clone()], CsvLayout::Chat).unwrap();
        let mut lines = csv.split('\n');
        assert_eq!(
            lines.next().unwrap(),
            "ts,id,lang,source,tag,confidence,mode,userName,program,level,feedback,userText,botText"
        );
        assert!(csv.contains("\"0.75\",\"local\""));
        assert!(csv.ends_with("\"He said \"\"hi\"\"\nthen left\""));

        let admin = to_csv(&[t], CsvLayout::Admin).unwrap();
        assert!(admin.starts_with("ts,id,mode,lang,source,tag,confidence,"));
        assert!(admin.contains("\"id1\",\"local\",\"en\",\"rule\""));
    }

    #[test]
    fn test_csv_empty_fields_and_no_trailing_newline() {
        let mut t = turn("id2", "ok");
        t.program.clear();
        let csv = to_csv(&[t], CsvLayout::Chat).unwrap();
        assert!(csv.contains("\"Sara\",\"\",\"UG\""));
        assert_eq!(csv.lines().count(), 2);
        assert!(!csv.ends_with('\n'));

        let header_only = to_csv(&[], CsvLayout::Admin).unwrap();
        assert_eq!(header_only, CsvLayout::Admin.columns().join(","));
    }

    #[test]
    fn test_json_export() {
        let temp_dir = TempDir::new().unwrap();
        let store = TranscriptStore::open(temp_dir.path().join("chat_logs.jsonl")).unwrap();
        store.append(&turn("a", "x")).unwrap();

        let dest = temp_dir.path().join("exports/chat_logs.json");
        assert_eq!(store.export_json(&dest).unwrap(), 1);
        let parsed: Vec<Turn> = serde_json::from_str(&fs::read_to_string(&dest).unwrap()).unwrap();
        assert_eq!(parsed[0].user_name, "Sara");
        let raw = fs::read_to_string(&dest).unwrap();
        assert!(raw.contains("\"userName\": \"Sara\""));
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = TranscriptStore::open(temp_dir.path().join("chat_logs.jsonl")).unwrap();
        store.append(&turn("a", "x")).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
