//! Core domain types
//!
//! These types describe the jobs the pipeline launches and observes, and the
//! pipeline itself. They are shared between the backend client (which decodes
//! them) and the runner (which drives them).

pub mod job;
pub mod pipeline;
pub mod target;
pub mod tool;
