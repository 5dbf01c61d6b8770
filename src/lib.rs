//! Repair Console - back-office console for a mobile repair shop
//!
//! Pages for customers, devices, models and mobile entries, backed by the
//! shop's REST API. This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod shop;
pub mod validation;
pub mod views;
