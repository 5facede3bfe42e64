//! Guest processor — one pass over the sheet.
//!
//! For every eligible row: write the QR artifact, email it, then mark the
//! row `Done`. The status write happens only after the send is confirmed,
//! and a row whose send failed is left untouched so the next cycle retries
//! it. If the status write itself fails the guest has been emailed but
//! stays eligible and will be emailed again next cycle; that is logged as
//! a separate error rather than hidden.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use guestpass_core::error::{GuestPassError, Result};
use guestpass_core::traits::{Notifier, RowSource, TokenEncoder};
use guestpass_core::types::{
    Attachment, CycleReport, DONE_MARKER, Delivery, GuestRecord, ProcessingOutcome, SkipReason,
    columns,
};

/// Runs one processing cycle against the injected collaborators.
pub struct GuestProcessor {
    rows: Arc<dyn RowSource>,
    encoder: Arc<dyn TokenEncoder>,
    notifier: Arc<dyn Notifier>,
    artifact_dir: PathBuf,
}

impl GuestProcessor {
    pub fn new(
        rows: Arc<dyn RowSource>,
        encoder: Arc<dyn TokenEncoder>,
        notifier: Arc<dyn Notifier>,
        artifact_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            rows,
            encoder,
            notifier,
            artifact_dir: artifact_dir.into(),
        }
    }

    /// Process every row once, in sheet order. Only a failed read aborts the
    /// cycle; row failures are recorded in the report.
    pub async fn run(&self) -> Result<CycleReport> {
        let started = Instant::now();
        let rows = self.rows.get_all_rows().await?;
        tracing::debug!(
            "📄 {} data row(s) from {}",
            rows.len().saturating_sub(1),
            self.rows.name()
        );

        let mut report = CycleReport::default();
        // Index 0 is the header; sheet rows are 1-based.
        for (idx, cells) in rows.iter().enumerate().skip(1) {
            let row_index = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            report.outcomes.push(self.process_row(cells, row_index).await);
        }
        report.duration = started.elapsed();
        Ok(report)
    }

    async fn process_row(&self, cells: &[String], row_index: u32) -> ProcessingOutcome {
        let guest = match GuestRecord::from_row(cells, row_index) {
            Ok(guest) => guest,
            Err(e) => {
                tracing::warn!(
                    row = row_index,
                    stage = e.stage(),
                    scope = e.scope().as_str(),
                    "⚠️ Skipping row: {e}"
                );
                return ProcessingOutcome::Skipped {
                    row_index,
                    reason: SkipReason::Malformed,
                };
            }
        };

        if !guest.is_eligible() {
            if !guest.status.is_done() {
                tracing::debug!(row = row_index, "Skipping incomplete registration");
            }
            return ProcessingOutcome::Skipped {
                row_index,
                reason: SkipReason::Ineligible,
            };
        }

        let artifact = match self.write_artifact(&guest).await {
            Ok(path) => path,
            Err(e) => return failed(&guest, e.restage(GuestPassError::Encode)),
        };

        let content_id = uuid::Uuid::new_v4().to_string();
        let delivery = Delivery {
            recipient: guest.email.clone(),
            guest_name: guest.name.clone(),
            language: guest.language,
            unique_id: content_id.clone(),
            attachments: vec![Attachment {
                content_id,
                path: artifact,
            }],
        };
        if let Err(e) = self.notifier.send(&delivery).await {
            return failed(&guest, e.restage(GuestPassError::Delivery));
        }

        let marked_done = match self
            .rows
            .update_cell(row_index, columns::STATUS_COLUMN, DONE_MARKER)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    row = row_index,
                    email = %guest.email,
                    via = self.notifier.name(),
                    "✅ Guest pass sent"
                );
                true
            }
            Err(e) => {
                let e = e.restage(GuestPassError::StateWrite);
                tracing::error!(
                    row = row_index,
                    email = %guest.email,
                    stage = e.stage(),
                    scope = e.scope().as_str(),
                    "❗ Email sent but row not marked {DONE_MARKER}; it will be sent again next cycle: {e}"
                );
                false
            }
        };

        ProcessingOutcome::Sent {
            row_index,
            marked_done,
        }
    }

    /// Encode the payload and write it to `<artifact_dir>/<email>.png`,
    /// replacing any earlier file for the same guest.
    async fn write_artifact(&self, guest: &GuestRecord) -> Result<PathBuf> {
        let bytes = self.encoder.encode(&guest.token_payload())?;
        tokio::fs::create_dir_all(&self.artifact_dir)
            .await
            .map_err(|e| {
                GuestPassError::Encode(format!("{}: {e}", self.artifact_dir.display()))
            })?;
        let path = self.artifact_dir.join(guest.artifact_file_name());
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| GuestPassError::Encode(format!("{}: {e}", path.display())))?;
        Ok(path)
    }
}

fn failed(guest: &GuestRecord, error: GuestPassError) -> ProcessingOutcome {
    tracing::warn!(
        row = guest.row_index,
        email = %guest.email,
        stage = error.stage(),
        scope = error.scope().as_str(),
        "⚠️ Guest not processed, will retry next cycle: {error}"
    );
    ProcessingOutcome::Failed {
        row_index: guest.row_index,
        error,
    }
}
