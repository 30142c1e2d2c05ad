/// Shared modules for the volspike report binaries
pub mod calendar;
pub mod config;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod text;
pub mod types;
