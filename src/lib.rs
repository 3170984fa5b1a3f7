//! pocket-tools: host for the All-in-one Pocket tool hub.
//!
//! Serves the hub and its tools, keeping a versioned offline copy of the
//! site's static assets:
//!   install (populate generation) → activate (evict stale generations) → handle (cache first)
//!
//! The tools themselves are exposed as a small JSON API.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod metrics;
pub mod server;
pub mod tools;
