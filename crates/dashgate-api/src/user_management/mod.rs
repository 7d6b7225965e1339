//! User Management System
//!
//! This module provides:
//! - User records and their client-facing view
//! - The credential store
//! - Authority-checked create, update and delete operations
//! - One-time seeding of the first super_admin

pub mod manager;
pub mod models;
pub mod store;

#[cfg(test)]
pub mod tests;

pub use manager::*;
pub use models::*;
pub use store::*;
