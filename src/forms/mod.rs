//! Form state that lives outside the validation schemas: the entry draft,
//! the model search-or-create lookup, and selected image files.

pub mod entry;
pub mod model_lookup;
pub mod uploads;

pub use entry::EntryDraft;
pub use model_lookup::ModelLookup;
pub use uploads::{Attachment, FileSelection, ImageSlot, MAX_FILE_BYTES};
