//! Image selection for the entry form.
//!
//! Selected files live outside the validated form fields. Files larger than
//! [`MAX_FILE_BYTES`] and files not declared as `image/*` are dropped from the
//! selection without failing the rest of the upload.

use axum::body::Bytes;
use uuid::Uuid;

/// Per-file ceiling: 8MB.
pub const MAX_FILE_BYTES: usize = 8 * 1024 * 1024;

/// Which multipart part a file travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Front,
    Additional,
}

impl ImageSlot {
    /// Multipart part name expected by the shop backend.
    #[must_use]
    pub fn part_name(self) -> &'static str {
        match self {
            Self::Front => "frontImage",
            Self::Additional => "additionalImages",
        }
    }
}

/// One image file ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub slot: ImageSlot,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Attachment {
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the file fits under the per-file ceiling.
    #[must_use]
    pub fn within_limit(&self) -> bool {
        self.len() <= MAX_FILE_BYTES
    }

    /// Whether the declared content type is an image type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type
            .split(';')
            .next()
            .and_then(|mime| mime.trim().split_once('/'))
            .is_some_and(|(kind, subtype)| {
                kind.eq_ignore_ascii_case("image") && !subtype.trim().is_empty()
            })
    }

    /// Whether the file can be staged: non-empty, an image, under the ceiling.
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        !self.is_empty() && self.is_image() && self.within_limit()
    }
}

/// A selected file together with the preview it was staged under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub preview_id: Uuid,
    pub attachment: Attachment,
}

/// Files currently chosen on an entry form.
///
/// Replacing the front image or removing a file hands back the superseded
/// preview ids so the caller can release them from the preview store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    front: Option<SelectedImage>,
    additional: Vec<SelectedImage>,
}

impl FileSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to its slot.
    ///
    /// Returns the preview ids that were superseded (a previous front image).
    /// Oversized, empty or non-image files are skipped and the selection is
    /// unchanged.
    pub fn select(&mut self, image: SelectedImage) -> Vec<Uuid> {
        if !image.attachment.is_acceptable() {
            tracing::debug!(
                file = %image.attachment.file_name,
                content_type = %image.attachment.content_type,
                size_bytes = image.attachment.len(),
                "upload_dropped"
            );
            return Vec::new();
        }

        match image.attachment.slot {
            ImageSlot::Front => self
                .front
                .replace(image)
                .map(|old| vec![old.preview_id])
                .unwrap_or_default(),
            ImageSlot::Additional => {
                self.additional.push(image);
                Vec::new()
            }
        }
    }

    /// Remove one file by preview id, returning whether it was selected.
    pub fn remove(&mut self, preview_id: Uuid) -> bool {
        if self.front.as_ref().is_some_and(|f| f.preview_id == preview_id) {
            self.front = None;
            return true;
        }
        let before = self.additional.len();
        self.additional.retain(|a| a.preview_id != preview_id);
        before != self.additional.len()
    }

    #[must_use]
    pub fn front(&self) -> Option<&SelectedImage> {
        self.front.as_ref()
    }

    #[must_use]
    pub fn additional(&self) -> &[SelectedImage] {
        &self.additional
    }

    #[must_use]
    pub fn has_front(&self) -> bool {
        self.front.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.front.is_none() && self.additional.is_empty()
    }

    /// Every preview id held by this selection.
    #[must_use]
    pub fn preview_ids(&self) -> Vec<Uuid> {
        self.front
            .iter()
            .chain(self.additional.iter())
            .map(|s| s.preview_id)
            .collect()
    }

    /// Files to send, front image first.
    #[must_use]
    pub fn attachments(&self) -> Vec<Attachment> {
        self.front
            .iter()
            .chain(self.additional.iter())
            .map(|s| s.attachment.clone())
            .collect()
    }
}
