//! In-memory collaborators for pipeline and scheduler tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use guestpass_core::error::{GuestPassError, Result};
use guestpass_core::traits::{Notifier, RowSource, TokenEncoder};
use guestpass_core::types::Delivery;

/// Shared, ordered record of side effects across fakes.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn cells(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|c| c.to_string()).collect()
}

pub fn header() -> Vec<String> {
    cells(&["Name", "Email", "Phone", "Language", "", "", "", "", "Status"])
}

/// Sheet held in memory. Writes are applied, so later reads see them.
pub struct MemorySheet {
    rows: Mutex<Vec<Vec<String>>>,
    pub writes: Mutex<Vec<(u32, u32, String)>>,
    pub reads: AtomicUsize,
    /// Number of upcoming reads that fail.
    pub failing_reads: AtomicUsize,
    /// Number of upcoming reads that panic.
    pub panicking_reads: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub read_delay: Option<Duration>,
    events: EventLog,
}

impl MemorySheet {
    pub fn new(rows: Vec<Vec<String>>, events: EventLog) -> Self {
        Self {
            rows: Mutex::new(rows),
            writes: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
            failing_reads: AtomicUsize::new(0),
            panicking_reads: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            read_delay: None,
            events,
        }
    }

    pub fn writes(&self) -> Vec<(u32, u32, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl RowSource for MemorySheet {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_all_rows(&self) -> Result<Vec<Vec<String>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if take_one(&self.panicking_reads) {
            panic!("sheet exploded");
        }
        if take_one(&self.failing_reads) {
            return Err(GuestPassError::SourceRead("sheet unreachable".into()));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn update_cell(&self, row: u32, column: u32, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GuestPassError::StateWrite("quota exceeded".into()));
        }
        self.events
            .lock()
            .unwrap()
            .push(format!("write:{row}:{column}:{value}"));
        self.writes
            .lock()
            .unwrap()
            .push((row, column, value.to_string()));

        let mut rows = self.rows.lock().unwrap();
        let r = &mut rows[(row - 1) as usize];
        let c = (column - 1) as usize;
        if r.len() <= c {
            r.resize(c + 1, String::new());
        }
        r[c] = value.to_string();
        Ok(())
    }
}

/// Encoder that records payloads and returns them as the "image".
#[derive(Default)]
pub struct RecordingEncoder {
    pub payloads: Mutex<Vec<String>>,
    pub fail_for: Mutex<HashSet<String>>,
}

impl TokenEncoder for RecordingEncoder {
    fn encode(&self, payload: &str) -> Result<Vec<u8>> {
        self.payloads.lock().unwrap().push(payload.to_string());
        if self
            .fail_for
            .lock()
            .unwrap()
            .iter()
            .any(|needle| payload.contains(needle.as_str()))
        {
            return Err(GuestPassError::Encode("encoder rejected payload".into()));
        }
        Ok(payload.as_bytes().to_vec())
    }
}

/// Notifier that records deliveries; fails for listed recipients.
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Delivery>>,
    pub attempts: AtomicUsize,
    pub fail_for: Mutex<HashSet<String>>,
    events: EventLog,
}

impl RecordingNotifier {
    pub fn new(events: EventLog) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail_for: Mutex::new(HashSet::new()),
            events,
        }
    }

    pub fn fail_for(&self, recipient: &str) {
        self.fail_for.lock().unwrap().insert(recipient.to_string());
    }

    pub fn recover(&self) {
        self.fail_for.lock().unwrap().clear();
    }

    pub fn sent(&self) -> Vec<Delivery> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, delivery: &Delivery) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.lock().unwrap().contains(&delivery.recipient) {
            return Err(GuestPassError::Delivery("SMTP 550 mailbox unavailable".into()));
        }
        self.events
            .lock()
            .unwrap()
            .push(format!("send:{}", delivery.recipient));
        self.sent.lock().unwrap().push(delivery.clone());
        Ok(())
    }
}
