//! Service layer
//!
//! The engine's building blocks: launching a tool, watching it until it is
//! done, and re-reading its results. Each one reports progress through a
//! `ScanObserver` instead of owning any presentation state.

pub mod deadline;
mod launcher;
pub mod observer;
mod refresher;
mod watcher;

pub use launcher::{JobHandle, JobLauncher};
pub use observer::{NoopObserver, ScanObserver, TracingObserver};
pub use refresher::ResultRefresher;
pub use watcher::CompletionWatcher;
