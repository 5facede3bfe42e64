//! Error taxonomy for GuestPass.
//!
//! Every variant belongs to a propagation scope: configuration errors stop
//! the process, source-read errors abort only the current cycle, and the
//! rest are confined to a single guest row.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GuestPassError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuestPassError {
    /// Missing or invalid configuration. Only raised at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The row store could not be read (unreachable, bad response).
    #[error("Source read error: {0}")]
    SourceRead(String),

    /// OAuth token exchange failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A row did not have the minimum expected cells.
    #[error("Malformed row: {0}")]
    RowMalformed(String),

    /// QR generation or artifact write failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Template, attachment or mail transport failure.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// The status cell could not be written after a confirmed send.
    #[error("State write error: {0}")]
    StateWrite(String),
}

/// How far an error is allowed to propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Stops the process.
    Fatal,
    /// Skips the rest of the current cycle.
    Cycle,
    /// Confined to one guest row.
    Row,
}

impl ErrorScope {
    /// Label used in structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Cycle => "cycle",
            Self::Row => "row",
        }
    }
}

impl GuestPassError {
    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::Config(_) => ErrorScope::Fatal,
            Self::SourceRead(_) | Self::Auth(_) => ErrorScope::Cycle,
            Self::RowMalformed(_) | Self::Encode(_) | Self::Delivery(_) | Self::StateWrite(_) => {
                ErrorScope::Row
            }
        }
    }

    /// Short stage label used in structured logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::SourceRead(_) => "read",
            Self::Auth(_) => "auth",
            Self::RowMalformed(_) => "parse",
            Self::Encode(_) => "encode",
            Self::Delivery(_) => "notify",
            Self::StateWrite(_) => "mark_done",
        }
    }

    /// The detail text, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m)
            | Self::SourceRead(m)
            | Self::Auth(m)
            | Self::RowMalformed(m)
            | Self::Encode(m)
            | Self::Delivery(m)
            | Self::StateWrite(m) => m,
        }
    }

    /// Re-tag under `stage`. An error already of that variant is kept as is;
    /// anything else keeps its own stage label in the message.
    pub fn restage(self, stage: fn(String) -> GuestPassError) -> GuestPassError {
        let tagged = stage(String::new());
        if std::mem::discriminant(&self) == std::mem::discriminant(&tagged) {
            self
        } else {
            stage(format!("{}: {}", self.stage(), self.message()))
        }
    }
}
