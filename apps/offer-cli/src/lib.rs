//! Commercial offer generator
//!
//! Reads goods lines from a supplier price list, prices them per variant and renders
//! one offer document per variant from the configured template.

pub mod batch;
pub mod config;
pub mod logging;
pub mod naming;
pub mod profiles;

pub use batch::{Batch, VariantOutput};
pub use config::Config;
pub use profiles::{CompanyStore, ProfileStoreError};
