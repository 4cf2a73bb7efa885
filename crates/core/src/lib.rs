// crates/core/src/lib.rs
//! Domain types shared by the monitor's storage and HTTP layers.
//!
//! Everything here is storage-independent: month bucketing for the
//! `yyyy-MM` keys every chart is grouped on, and the per-dataset
//! descriptors that carry the group-by allow-lists.

pub mod dataset;
pub mod month;

pub use dataset::{DatasetSpec, Dimension, InvalidDimension, ROP, SETUP_TIME};
pub use month::{MonthKey, MonthKeyError};
