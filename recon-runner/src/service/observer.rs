//! Scan observers
//!
//! The engine never touches presentation state. Progress leaves the engine
//! only through a `ScanObserver` handed to each launch, watch and refresh.

use recon_core::domain::job::JobRecord;
use recon_core::domain::target::TargetAggregates;
use recon_core::domain::tool::Tool;
use tracing::{info, warn};

/// Receives externally visible progress
pub trait ScanObserver: Send + Sync {
    /// The most recent record of a tool changed (including synthetic records)
    fn on_status_changed(&self, tool: Tool, record: &JobRecord);

    /// A tool started or stopped running
    fn on_running_changed(&self, tool: Tool, running: bool);

    /// Aggregate result sets were re-read after a consolidation
    fn on_aggregates_changed(&self, _aggregates: &TargetAggregates) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl ScanObserver for NoopObserver {
    fn on_status_changed(&self, _tool: Tool, _record: &JobRecord) {}

    fn on_running_changed(&self, _tool: Tool, _running: bool) {}
}

/// Observer that reports progress as log lines
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn on_status_changed(&self, tool: Tool, record: &JobRecord) {
        if record.status.is_synthetic() {
            warn!(
                tool = %tool,
                scan_id = %record.id,
                status = %record.status,
                "{}",
                record.message.as_deref().unwrap_or("watch gave up")
            );
        } else {
            info!(tool = %tool, scan_id = %record.id, status = %record.status, "Scan status");
        }
    }

    fn on_running_changed(&self, tool: Tool, running: bool) {
        info!(tool = %tool, running, "Scan running state");
    }

    fn on_aggregates_changed(&self, aggregates: &TargetAggregates) {
        info!(
            subdomains = aggregates.consolidated_subdomains.len(),
            live_web_servers = aggregates.live_web_servers,
            "Consolidated results"
        );
    }
}
