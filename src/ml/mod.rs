//! Machine learning building blocks used by the trainer.
//!
//! Models are plain serde structs so they can be written as JSON artifacts and
//! loaded back without any runtime beyond this crate.

pub mod features;
pub mod forest;
pub mod label;
pub mod linear;
pub mod metrics;
pub mod split;
