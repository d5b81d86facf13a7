//! services/api/src/lib.rs
//!
//! The HTTP service for the publishing engine: configuration, the concrete
//! store and crypto adapters, and the axum web surface over the core crate.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
