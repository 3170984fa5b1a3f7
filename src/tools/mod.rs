//! The hub's tools as pure functions.
//!
//! - [`units`]: unit converter tables and temperature formulas
//! - [`percentage`]: percentage calculator modes
//! - [`typing`]: typing test texts, scoring and countdown
//! - [`text_stats`]: character counter
//! - [`catalog`]: tool catalog search and category filter
//! - [`theme`]: persisted light/dark preference

pub mod catalog;
pub mod percentage;
pub mod text_stats;
pub mod theme;
pub mod typing;
pub mod units;
