//! Scheduler layer
//!
//! Drives a pipeline definition step by step for one target, persisting
//! progress before each step so an interrupted run can be resumed.

pub mod runner;

pub use runner::{PipelineRunner, RunSummary, RunnerPorts, RunnerSettings, StepOutcome, StepReport};
