//! Collaborator traits. The pipeline only talks to the outside world
//! through these, so every implementation can be swapped or faked.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Delivery;

/// Tabular data source holding the guest list and its status column.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Read the whole sheet. Index 0 is the header row.
    async fn get_all_rows(&self) -> Result<Vec<Vec<String>>>;

    /// Write one cell. `row` and `column` are 1-based; row 1 is the header.
    async fn update_cell(&self, row: u32, column: u32, value: &str) -> Result<()>;
}

/// Turns a payload string into a scannable image.
pub trait TokenEncoder: Send + Sync {
    /// PNG bytes; the caller decides where they are stored.
    fn encode(&self, payload: &str) -> Result<Vec<u8>>;
}

/// Sends one rendered message to one recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, delivery: &Delivery) -> Result<()>;
}
