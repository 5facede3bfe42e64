//! # GuestPass Gateway
//! Liveness endpoint for process supervisors. Never touches processing
//! state beyond reading the scheduler's current state.

pub mod server;

pub use server::{AppState, bind, build_router, serve};
