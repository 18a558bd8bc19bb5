//! Common definitions shared by the typeinfo crates.
//!
//! This crate provides foundational values used across the workspace:
//! - Cache sizing and sweep thresholds
//! - Signature parser nesting limits
//! - Supertype walk bounds

// Centralized limits and thresholds
pub mod limits;
