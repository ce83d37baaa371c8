//! # Arbor Support
//!
//! Shared utilities for the Arbor container crates.
//!
//! This crate provides:
//! - Hierarchy path and tree rendering
//! - Type-name shortening and "did you mean?" suggestions for error messages

pub mod rendering;
