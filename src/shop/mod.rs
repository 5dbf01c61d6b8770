//! Remote shop backend: wire types and the HTTP client.

pub mod client;
pub mod models;

pub use client::{EntrySubmission, ShopClient};
