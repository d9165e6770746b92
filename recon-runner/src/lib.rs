//! Recon Runner
//!
//! Orchestrates a fixed sequence of reconnaissance tools against one target.
//! The tools themselves run on a backend; this crate starts them one at a
//! time, watches each until it is done, and persists how far the run got.
//!
//! Architecture:
//! - Configuration: timing budget and backend settings from the environment
//! - Repositories: ports to the backend scan API, consolidation, run state
//! - Services: launcher, completion watcher, result refresher, observers
//! - Scheduler: the pipeline runner that ties them together

pub mod commands;
pub mod config;
pub mod repository;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;
