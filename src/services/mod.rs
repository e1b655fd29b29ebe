pub mod availability;
pub mod engine;
pub mod filters;
pub mod loader;
pub mod ranking;
pub mod search;

pub use availability::AvailabilityResolver;
pub use engine::DiscoveryEngine;
pub use filters::FilterPipeline;
pub use loader::{BulkLoader, CatalogSnapshot, DataIntegrityWarning};
