//! Data Transfer Objects for the backend job-control API
//!
//! Lightweight request and response bodies exchanged with the backend that
//! executes the discovery tools.

pub mod scan;
