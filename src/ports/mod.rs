//! Port traits separating the domain from storage, config, and rendering.

pub mod bar_store_port;
pub mod config_port;
pub mod fetch_port;
pub mod fill_port;
pub mod report_port;
