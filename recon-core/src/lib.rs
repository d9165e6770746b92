//! Recon Core
//!
//! Core types shared by the recon pipeline engine and its backend client.
//!
//! This crate contains:
//! - Domain types: tools, scan records, pipeline steps and run state
//! - DTOs: request/response bodies for the backend job-control API

pub mod domain;
pub mod dto;
