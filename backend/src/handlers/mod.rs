//! HTTP handlers for the Reorder Portal

pub mod auth;
pub mod health;
pub mod reorder;
pub mod upload;

pub use auth::*;
pub use health::*;
pub use reorder::*;
pub use upload::*;
