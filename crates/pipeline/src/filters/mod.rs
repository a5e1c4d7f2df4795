//! Filter implementations for the ranking pipeline.

pub mod excluded;

// Re-export for convenience
pub use excluded::ExcludedItemsFilter;
