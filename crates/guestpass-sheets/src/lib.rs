//! # GuestPass Sheets
//! `RowSource` backed by the Google Sheets v4 REST API.
//!
//! Authentication uses a service-account key: a short-lived RS256 JWT is
//! exchanged for an OAuth access token, which is cached until shortly
//! before it expires.

pub mod auth;
pub mod client;

pub use auth::TokenProvider;
pub use client::SheetsRowSource;
