//! Library exports for the memorial QR demo application
//!
//! This module exposes internal components for testing and potential library usage.

pub mod commission;
pub mod directory;
pub mod handler;
pub mod model;
pub mod resolver;
pub mod route;
pub mod store;
pub mod upload;
