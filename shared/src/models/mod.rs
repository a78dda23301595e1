//! Domain models for the reorder view

pub mod reorder;

pub use reorder::*;
