//! Domain types — guest rows, eligibility and per-guest outcomes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::GuestPassError;

/// Cell positions within a raw row (0-based).
pub mod columns {
    pub const NAME: usize = 0;
    pub const EMAIL: usize = 1;
    pub const PHONE: usize = 2;
    pub const LANGUAGE: usize = 3;
    pub const STATUS: usize = 8;
    /// Column number of the status cell for `RowSource::update_cell` (1-based, `I`).
    pub const STATUS_COLUMN: u32 = STATUS as u32 + 1;
}

/// Value written to the status cell once a guest has been emailed.
pub const DONE_MARKER: &str = "Done";

/// Preferred language of the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    Ru,
    Other,
}

impl Language {
    pub fn from_cell(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("ru") {
            Self::Ru
        } else {
            Self::Other
        }
    }

    /// Code used for template lookup (`template-<code>.html`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::Other => "en",
        }
    }
}

/// Processing status of a row, typed at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    /// Empty status cell.
    Pending,
    /// Already emailed. Matches `done` in any case, surrounded by any whitespace.
    Done,
    /// Anything else. Still eligible.
    Other(String),
}

impl RowStatus {
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Pending
        } else if trimmed.eq_ignore_ascii_case(DONE_MARKER) {
            Self::Done
        } else {
            Self::Other(trimmed.to_string())
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// One guest row, read fresh every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub language: Language,
    pub status: RowStatus,
    /// Sheet row number (1-based, the header is row 1).
    pub row_index: u32,
}

impl GuestRecord {
    /// Parse a raw row. `row_index` is the sheet row number.
    /// Trailing cells missing from the source are read as empty, so a short
    /// row parses as an incomplete registration. Only a row with no content
    /// at all is malformed.
    pub fn from_row(cells: &[String], row_index: u32) -> Result<Self, GuestPassError> {
        if cells.iter().all(|c| c.trim().is_empty()) {
            return Err(GuestPassError::RowMalformed(format!("row {row_index} is empty")));
        }
        let cell = |i: usize| cells.get(i).map(|c| c.trim()).unwrap_or_default();
        Ok(Self {
            name: cell(columns::NAME).to_string(),
            email: cell(columns::EMAIL).to_string(),
            phone: cell(columns::PHONE).to_string(),
            language: Language::from_cell(cell(columns::LANGUAGE)),
            status: RowStatus::from_cell(cell(columns::STATUS)),
            row_index,
        })
    }

    /// All required fields present and not yet done.
    pub fn is_eligible(&self) -> bool {
        !self.name.is_empty()
            && !self.phone.is_empty()
            && !self.email.is_empty()
            && !self.status.is_done()
    }

    /// QR payload. The line order and `Key: value` shape are read by scanners.
    pub fn token_payload(&self) -> String {
        format!(
            "Name: {}\nPhone: {}\nEmail: {}",
            self.name, self.phone, self.email
        )
    }

    /// Artifact file name derived from the email address.
    pub fn artifact_file_name(&self) -> String {
        let sanitized: String = self
            .email
            .chars()
            .map(|c| match c {
                '@' | '/' | '\\' => '_',
                other => other,
            })
            .collect();
        format!("{sanitized}.png")
    }
}

/// An inline image referenced from the message body by content-id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub content_id: String,
    pub path: PathBuf,
}

/// Everything a notifier needs to send one guest message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: String,
    pub guest_name: String,
    pub language: Language,
    /// Template variable; equals the content-id of the QR attachment.
    pub unique_id: String,
    pub attachments: Vec<Attachment>,
}

/// Why a row was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Malformed,
    Ineligible,
}

/// Result of one attempt for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Email confirmed sent. `marked_done` is false when the status write
    /// failed afterwards, in which case the guest will be emailed again.
    Sent { row_index: u32, marked_done: bool },
    Skipped { row_index: u32, reason: SkipReason },
    Failed { row_index: u32, error: GuestPassError },
}

/// Aggregate of one full pass over the sheet.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub outcomes: Vec<ProcessingOutcome>,
    pub duration: Duration,
}

impl CycleReport {
    pub fn sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ProcessingOutcome::Sent { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ProcessingOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ProcessingOutcome::Failed { .. }))
            .count()
    }

    /// Sends whose status write failed (duplicate-send candidates).
    pub fn unmarked(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ProcessingOutcome::Sent { marked_done: false, .. }))
            .count()
    }
}
