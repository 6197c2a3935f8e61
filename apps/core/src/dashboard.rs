//! Admin statistics over the transcript.
//!
//! Filters narrow the visible turns; every count and list below is computed over
//! the visible turns only, except the overview totals and the user list.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::brain::dataset::FALLBACK_TAG;
use crate::config::ChatMode;
use crate::error::AppError;
use crate::transcript::{Feedback, Turn};

/// Size of the recent-activity list.
pub const RECENT_LIMIT: usize = 50;
/// Size of the unresolved list.
pub const UNRESOLVED_LIMIT: usize = 80;

/// Feedback filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackFilter {
    #[default]
    All,
    /// Turns without feedback
    None,
    Up,
    Down,
}

impl FeedbackFilter {
    fn accepts(&self, feedback: Feedback) -> bool {
        match self {
            FeedbackFilter::All => true,
            FeedbackFilter::None => feedback == Feedback::None,
            FeedbackFilter::Up => feedback == Feedback::Up,
            FeedbackFilter::Down => feedback == Feedback::Down,
        }
    }
}

impl FromStr for FeedbackFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" | "(all)" => Ok(FeedbackFilter::All),
            "none" => Ok(FeedbackFilter::None),
            "up" => Ok(FeedbackFilter::Up),
            "down" => Ok(FeedbackFilter::Down),
            other => Err(AppError::Validation(format!("Unknown feedback filter '{}'", other))),
        }
    }
}

/// Which turns are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilter {
    /// Exact display name; `None` means all users
    pub user: Option<String>,
    pub mode: Option<ChatMode>,
    pub feedback: FeedbackFilter,
    /// Case-insensitive substring over user and bot text; blank means no search
    pub search: String,
}

impl DashboardFilter {
    pub fn matches(&self, turn: &Turn) -> bool {
        if let Some(user) = &self.user {
            if turn.display_user() != user {
                return false;
            }
        }
        if let Some(mode) = self.mode {
            if turn.mode != mode {
                return false;
            }
        }
        if !self.feedback.accepts(turn.feedback) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() {
            let haystack = format!("{} {}", turn.user_text, turn.bot_text).to_lowercase();
            if !haystack.contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Field to group counts by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountKey {
    Tag,
    Lang,
    Source,
    User,
}

fn key_of(turn: &Turn, key: CountKey) -> String {
    let value = match key {
        CountKey::Tag => turn.tag.as_str(),
        CountKey::Lang => turn.lang.as_str(),
        CountKey::Source => turn.source.as_str(),
        CountKey::User => turn.display_user(),
    };
    if value.is_empty() {
        "unknown".to_string()
    } else {
        value.to_string()
    }
}

/// Counts per distinct value, highest first; ties keep first-seen order.
pub fn count_by(turns: &[&Turn], key: CountKey) -> Vec<(String, usize)> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for turn in turns {
        let k = key_of(turn, key);
        match positions.get(&k) {
            Some(&i) => counts[i].1 += 1,
            None => {
                positions.insert(k.clone(), counts.len());
                counts.push((k, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Computed dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    /// All logged turns
    pub total: usize,
    /// Turns passing the filter
    pub visible: usize,
    /// Timestamp of the last logged turn
    pub last_activity: Option<String>,
    /// Every distinct user, sorted
    pub users: Vec<String>,
    pub intents: Vec<(String, usize)>,
    pub languages: Vec<(String, usize)>,
    pub sources: Vec<(String, usize)>,
    pub top_users: Vec<(String, usize)>,
    /// `lang:en`, `lang:ar`, then one `src:*` entry per source
    pub combined: Vec<(String, usize)>,
    /// Newest first
    pub recent: Vec<Turn>,
    /// Down-voted or fallback turns, newest first
    pub unresolved: Vec<Turn>,
}

fn newest_first(turns: &[&Turn], limit: usize) -> Vec<Turn> {
    turns.iter().rev().take(limit).map(|t| (*t).clone()).collect()
}

impl DashboardReport {
    pub fn build(turns: &[Turn], filter: &DashboardFilter) -> Self {
        let visible: Vec<&Turn> = turns.iter().filter(|t| filter.matches(t)).collect();

        let users: Vec<String> = turns
            .iter()
            .map(|t| t.display_user().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let languages = count_by(&visible, CountKey::Lang);
        let sources = count_by(&visible, CountKey::Source);
        let lang_count = |code: &str| {
            languages
                .iter()
                .find(|(k, _)| k == code)
                .map_or(0, |(_, n)| *n)
        };
        let mut combined = vec![
            ("lang:en".to_string(), lang_count("en")),
            ("lang:ar".to_string(), lang_count("ar")),
        ];
        combined.extend(sources.iter().map(|(k, n)| (format!("src:{}", k), *n)));

        let unresolved: Vec<&Turn> = visible
            .iter()
            .copied()
            .filter(|t| t.feedback == Feedback::Down || t.tag == FALLBACK_TAG)
            .collect();

        Self {
            total: turns.len(),
            visible: visible.len(),
            last_activity: turns.last().map(|t| t.ts.clone()),
            users,
            intents: count_by(&visible, CountKey::Tag),
            top_users: count_by(&visible, CountKey::User),
            languages,
            sources,
            combined,
            recent: newest_first(&visible, RECENT_LIMIT),
            unresolved: newest_first(&unresolved, UNRESOLVED_LIMIT),
        }
    }
}

fn write_counts(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    counts: &[(String, usize)],
) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    if counts.is_empty() {
        return writeln!(f, "  (none)");
    }
    for (key, n) in counts.iter().take(12) {
        writeln!(f, "  {:<28} {}", key, n)?;
    }
    Ok(())
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total messages (all): {}", self.total)?;
        writeln!(f, "Visible after filters: {}", self.visible)?;
        writeln!(
            f,
            "Last activity: {}",
            self.last_activity.as_deref().unwrap_or("-")
        )?;
        write_counts(f, "Top intents", &self.intents)?;
        write_counts(f, "Language + source", &self.combined)?;
        write_counts(f, "Top users", &self.top_users)?;
        writeln!(f, "Unresolved: {}", self.unresolved.len())?;
        for turn in self.unresolved.iter().take(5) {
            writeln!(
                f,
                "  [{}] {} ({}): {}",
                turn.ts,
                turn.display_user(),
                turn.tag,
                turn.user_text
            )?;
        }
        Ok(())
    }
}
