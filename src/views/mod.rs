//! Server-side HTML rendering.

pub mod detail;
pub mod forms;
pub mod html;
pub mod table;

pub use html::{Notice, NoticeLevel};
pub use table::Table;
