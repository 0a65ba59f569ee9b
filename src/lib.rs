//! tradereview — intraday trade quality review.
//!
//! Pairs raw broker fills into round-trip trades, scores each one against
//! minute-bar market context, and renders markdown review reports.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
