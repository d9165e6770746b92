//! Repository layer
//!
//! Repositories are the ports the engine talks through: the backend's scan
//! API, its consolidation routine, and the store holding the run marker.
//! They carry no business logic.
//!
//! All repositories are trait-based so the engine can be driven by fakes.

mod consolidation;
mod run_state;
mod scans;

// Re-export traits
pub use consolidation::Consolidator;
pub use run_state::RunStateStore;
pub use scans::ScanRepository;

// Re-export implementations
pub use consolidation::HttpConsolidator;
pub use run_state::{FileRunStateStore, InMemoryRunStateStore};
pub use scans::HttpScanRepository;
