//! Working state of the mobile-entry form between round trips.

use crate::forms::model_lookup::ModelLookup;
use crate::forms::uploads::FileSelection;
use crate::shop::client::EntrySubmission;
use crate::shop::models::{EntryPayload, Model};
use crate::validation::EntryForm;

#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub form: EntryForm,
    pub files: FileSelection,
    pub lookup: ModelLookup,
}

impl EntryDraft {
    #[must_use]
    pub fn new(form: EntryForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn device_id(&self) -> Option<i64> {
        self.form.device.trim().parse().ok()
    }

    #[must_use]
    pub fn model_id(&self) -> Option<i64> {
        self.form.model.trim().parse().ok()
    }

    /// Switch the selected device.
    ///
    /// `models` is the model list of the new device. A selected model that is
    /// not in it is cleared together with any pending lookup. Returns whether
    /// the model was cleared.
    pub fn select_device(&mut self, device_id: Option<i64>, models: &[Model]) -> bool {
        self.form.device = device_id.map(|id| id.to_string()).unwrap_or_default();

        let keeps_model = match (device_id, self.model_id()) {
            (Some(device), Some(model)) => models
                .iter()
                .any(|m| m.id == model && m.device_id == device),
            (_, None) => return false,
            (None, Some(_)) => false,
        };

        if keeps_model {
            return false;
        }

        tracing::debug!(device_id = ?device_id, model = %self.form.model, "Clearing model of another device");
        self.form.model.clear();
        self.lookup = ModelLookup::Idle;
        true
    }

    pub fn select_model(&mut self, model: &Model) {
        self.form.model = model.id.to_string();
    }

    pub fn select_customer(&mut self, customer_id: i64) {
        self.form.customer = customer_id.to_string();
    }

    /// Mirror the file selection into the validated form.
    pub fn sync_files(&mut self) {
        self.form.has_front_image = self.files.has_front();
    }

    /// Pair a validated payload with the selected files.
    #[must_use]
    pub fn submission(&self, payload: EntryPayload) -> EntrySubmission {
        EntrySubmission {
            payload,
            attachments: self.files.attachments(),
        }
    }
}

/// Models that belong to `device_id` and are active.
#[must_use]
pub fn models_for_picker(models: &[Model], device_id: i64) -> Vec<Model> {
    models
        .iter()
        .filter(|m| m.device_id == device_id && m.is_active)
        .cloned()
        .collect()
}
