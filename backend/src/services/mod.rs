//! Business logic services for the Reorder Portal

pub mod auth;
pub mod export;
pub mod reorder;
pub mod upload;

pub use auth::AuthService;
pub use reorder::ReorderService;
pub use upload::UploadService;
