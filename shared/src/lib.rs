//! Shared types and domain logic for the TWBP Reorder Portal
//!
//! This crate contains the reorder view models and the pure derivation
//! pipeline shared between the backend and any future frontend build.

pub mod engine;
pub mod models;
pub mod validation;

pub use models::*;
pub use validation::*;
