//! Staged uploads.
//!
//! A file accepted by the entry form is staged here so a re-rendered form can
//! show it and send it again on the next submit. Callers release previews when
//! they are superseded, after a successful submission, or when the form is
//! cancelled; idle expiry catches forms that were simply abandoned.

use moka::future::Cache;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::forms::uploads::{Attachment, SelectedImage};

#[derive(Clone)]
pub struct PreviewStore {
    staged: Cache<Uuid, Attachment>,
}

impl PreviewStore {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_idle(Duration::from_secs(config.preview_idle_seconds))
    }

    #[must_use]
    pub fn with_idle(idle: Duration) -> Self {
        let staged = Cache::builder()
            .weigher(|_id: &Uuid, file: &Attachment| -> u32 {
                file.len().try_into().unwrap_or(u32::MAX)
            })
            // 512MB of staged image data
            .max_capacity(512 * 1024 * 1024)
            .time_to_idle(idle)
            .build();
        Self { staged }
    }

    /// Stage a file and hand back its selection handle.
    pub async fn stage(&self, attachment: Attachment) -> SelectedImage {
        let preview_id = Uuid::new_v4();
        tracing::debug!(
            %preview_id,
            file = %attachment.file_name,
            size_bytes = attachment.len(),
            "preview_staged"
        );
        self.staged.insert(preview_id, attachment.clone()).await;
        SelectedImage {
            preview_id,
            attachment,
        }
    }

    pub async fn get(&self, preview_id: Uuid) -> Option<Attachment> {
        self.staged.get(&preview_id).await
    }

    /// Rebuild a selection handle from a previously staged id.
    pub async fn restore(&self, preview_id: Uuid) -> Option<SelectedImage> {
        self.get(preview_id).await.map(|attachment| SelectedImage {
            preview_id,
            attachment,
        })
    }

    pub async fn release(&self, preview_id: Uuid) {
        if self.staged.remove(&preview_id).await.is_some() {
            tracing::debug!(%preview_id, "preview_released");
        }
    }

    pub async fn release_all(&self, preview_ids: &[Uuid]) {
        for id in preview_ids {
            self.release(*id).await;
        }
    }

    /// Number of staged files (approximate until pending tasks run).
    pub async fn len(&self) -> u64 {
        self.staged.run_pending_tasks().await;
        self.staged.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
