//! Core domain types and logic.

pub mod bar;
pub mod fill;
pub mod trade;
pub mod pairing;
pub mod score;
pub mod policy;
pub mod scoring;
pub mod stats;
pub mod profile;
pub mod error;
