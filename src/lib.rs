//! Client-side discovery engine for a locally replicated media catalog.
//!
//! The catalog is paged out of a row-capped remote store once per session
//! ([`services::BulkLoader`]), then every search action runs in memory: ordered filter
//! stages ([`services::FilterPipeline`]), an optional provider-availability join
//! ([`services::AvailabilityResolver`]) and a sort with one heuristic override
//! ([`services::ranking`]). [`services::DiscoveryEngine`] bundles these for callers.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
