//! # GuestPass Scheduler
//!
//! The guest-processing pipeline and the loop that drives it.
//!
//! ## Architecture
//! ```text
//! SchedulerEngine (serial: run → sleep → run …)
//!   └── GuestProcessor::run()            one cycle
//!         ├── RowSource::get_all_rows()  single read
//!         └── per eligible row, in order:
//!               TokenEncoder::encode → artifact file
//!               Notifier::send       → email with inline QR
//!               RowSource::update_cell(row, I, "Done")
//! ```
//!
//! Row failures stay with the row, read failures stay with the cycle, and
//! panics inside a cycle are caught; the loop only ends on shutdown.

pub mod engine;
pub mod processor;
pub mod qr;

#[cfg(test)]
mod testing;

pub use engine::{SchedulerEngine, SchedulerState, spawn_scheduler};
pub use processor::GuestProcessor;
pub use qr::QrEncoder;
