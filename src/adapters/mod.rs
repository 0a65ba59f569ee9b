//! Concrete adapter implementations for the port traits.

pub mod csv_fill_adapter;
pub mod fetch_adapter;
pub mod file_config_adapter;
pub mod markdown_report_adapter;
pub mod records_adapter;
#[cfg(feature = "web")]
pub mod web;
