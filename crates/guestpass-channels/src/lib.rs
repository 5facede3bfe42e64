//! # GuestPass Channels
//! Outbound notification channels.
//!
//! - `template` — per-language HTML templates, loaded from disk on every send
//! - `email` — SMTP delivery with inline QR images referenced by content-id

pub mod email;
pub mod template;

pub use email::EmailNotifier;
pub use template::TemplateStore;
