//! SLA Policy Module
//!
//! Provides the per-severity policy catalog:
//! - Response and resolution deadline targets
//! - Compliance target percentages

pub mod catalog;

pub use catalog::{PolicyCatalog, SlaPolicy};
