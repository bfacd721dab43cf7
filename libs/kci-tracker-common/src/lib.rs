//! KCI Tracker Common - Shared constants and utilities
//!
//! This crate provides the constants and small helpers shared between the
//! tracker core library and the CLI.
//!
//! # Examples
//!
//! ```
//! use kci_tracker_common::{is_blank, CACHE_NAMESPACE};
//!
//! assert_eq!(CACHE_NAMESPACE, "kci-tracker-cache");
//! assert!(is_blank("   "));
//! ```

pub mod constants;
pub mod utils;

pub use constants::*;
pub use utils::*;
