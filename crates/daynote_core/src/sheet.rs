//! Markdown day sheet used by the edit flow.
//!
//! # Responsibility
//! - Render one day as an editable markdown document.
//! - Parse an edited document back into entries and free text.
//!
//! # Invariants
//! - `parse(render(x))` yields every active note of `x` with its id and
//!   completion flag unchanged and its body equal to `normalize_body(body)`.
//!   Line breaks and backslashes in bodies are escaped so an entry always
//!   stays on one line.
//! - Free text parses back to `normalize_day_text(day_text)`.
//! - Parsing never touches storage; reconciliation lives in the service.
//!
//! Format:
//!
//! ```text
//! # Today: 2024-01-01
//!
//!  - [ ] :1: buy milk
//!  - [x] :2: call the bank
//!  - [ ] :
//!
//! free text kept as the day's text
//! ```

use crate::model::day::DayNotes;
use crate::model::note::{Note, NoteId};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const TODAY_PREFIX: &str = "# Today: ";
const DAY_PREFIX: &str = "# Day: ";

static ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\s*\[([ xX])\]\s*:(.*)$").expect("valid entry regex"));
static EXISTING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(.*)$").expect("valid existing entry regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// No `# Today:` / `# Day:` header before the first content line.
    MissingHeader,
    InvalidDate(String),
    /// An entry line (starting with `-`) that does not follow the format.
    MalformedEntry { line_no: usize, line: String },
}

impl Display for SheetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "sheet has no `# Today:` or `# Day:` header"),
            Self::InvalidDate(value) => write!(f, "invalid sheet date `{value}`"),
            Self::MalformedEntry { line_no, line } => {
                write!(f, "malformed entry on line {line_no}: `{line}`")
            }
        }
    }
}

impl Error for SheetError {}

/// One checkbox line of a parsed sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetEntry {
    Existing {
        id: NoteId,
        body: String,
        completed: bool,
    },
    New {
        body: String,
        completed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSheet {
    pub date: NaiveDate,
    pub entries: Vec<SheetEntry>,
    /// Non-entry lines with trailing whitespace and outer blank lines removed.
    pub day_text: String,
}

impl ParsedSheet {
    /// Ids of the existing notes still listed on the sheet.
    pub fn listed_ids(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            SheetEntry::Existing { id, .. } => Some(*id),
            SheetEntry::New { .. } => None,
        })
    }
}

/// Renders the editable markdown sheet for `day`.
pub fn render(day: &DayNotes, today: NaiveDate) -> String {
    let prefix = if day.date == today {
        TODAY_PREFIX
    } else {
        DAY_PREFIX
    };
    let mut out = format!("{prefix}{}\n\n", day.date);
    for note in &day.notes {
        out.push_str(&entry_line(note));
        out.push('\n');
    }
    out.push_str(" - [ ] :\n\n");
    out.push_str(&day.day_text);
    out
}

/// Renders a read-only summary of `day` for terminal output.
pub fn render_summary(day: &DayNotes, today: NaiveDate) -> String {
    let label = if day.date == today { "Today" } else { "Day" };
    let mut out = format!("{label}: {}\n\n", day.date);
    for note in &day.notes {
        out.push_str(&entry_line(note));
        out.push('\n');
    }
    if day.notes.is_empty() {
        out.push_str("No notes.\n");
    }
    if !day.day_text.is_empty() {
        out.push('\n');
        out.push_str(&day.day_text);
        if !day.day_text.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Parses an edited sheet.
///
/// Blank lines are ignored everywhere. Entries with an empty body and no id
/// (the placeholder line) are dropped.
pub fn parse(text: &str) -> Result<ParsedSheet, SheetError> {
    let mut lines = text.lines().enumerate();
    let mut date = None;
    for (_, line) in lines.by_ref() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let raw_date = line
            .strip_prefix(TODAY_PREFIX)
            .or_else(|| line.strip_prefix(DAY_PREFIX))
            .ok_or(SheetError::MissingHeader)?
            .trim();
        date = Some(
            raw_date
                .parse::<NaiveDate>()
                .map_err(|_| SheetError::InvalidDate(raw_date.to_string()))?,
        );
        break;
    }
    let date = date.ok_or(SheetError::MissingHeader)?;

    let mut entries = Vec::new();
    let mut free_text: Vec<&str> = Vec::new();
    for (index, raw_line) in lines {
        let line = raw_line.trim();
        if line.is_empty() {
            if !free_text.is_empty() {
                free_text.push("");
            }
            continue;
        }
        if !line.starts_with('-') {
            free_text.push(raw_line.trim_end());
            continue;
        }

        let malformed = || SheetError::MalformedEntry {
            line_no: index + 1,
            line: line.to_string(),
        };
        let caps = ENTRY_RE.captures(line).ok_or_else(malformed)?;
        let completed = !caps[1].trim().is_empty();
        let rest = &caps[2];

        match EXISTING_RE.captures(rest) {
            Some(existing) => {
                let id = existing[1].parse::<NoteId>().map_err(|_| malformed())?;
                entries.push(SheetEntry::Existing {
                    id,
                    body: unescape_body(existing[2].trim()),
                    completed,
                });
            }
            None => {
                let body = rest.trim();
                if !body.is_empty() {
                    entries.push(SheetEntry::New {
                        body: unescape_body(body),
                        completed,
                    });
                }
            }
        }
    }
    while free_text.last() == Some(&"") {
        free_text.pop();
    }

    Ok(ParsedSheet {
        date,
        entries,
        day_text: free_text.join("\n"),
    })
}

/// Body as it reads back from a sheet: escaped, trimmed, then unescaped.
pub fn normalize_body(body: &str) -> String {
    unescape_body(escape_body(body).trim())
}

/// Free text as it reads back from a sheet.
pub fn normalize_day_text(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|line| !line.is_empty());
    let end = lines.iter().rposition(|line| !line.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

fn entry_line(note: &Note) -> String {
    let tick = if note.completed { "x" } else { " " };
    format!(" - [{tick}] :{}: {}", note.id, escape_body(&note.body))
}

fn escape_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for ch in body.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

// Unknown escapes are kept verbatim.
fn unescape_body(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
