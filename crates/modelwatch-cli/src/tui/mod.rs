//! Live terminal dashboard.

pub mod app;
pub mod ui;
