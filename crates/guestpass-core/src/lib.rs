//! # GuestPass Core
//!
//! Shared building blocks for the guest-pass pipeline:
//! - `error` — the error taxonomy and its propagation scopes
//! - `config` — environment-sourced configuration, validated at startup
//! - `types` — guest rows, eligibility, per-guest outcomes
//! - `traits` — the collaborator seams (row store, token encoder, notifier)

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{ErrorScope, GuestPassError, Result};
pub use traits::{Notifier, RowSource, TokenEncoder};
pub use types::{
    Attachment, CycleReport, Delivery, GuestRecord, Language, ProcessingOutcome, RowStatus,
    SkipReason,
};
