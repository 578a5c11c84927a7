//! Gallery search and ordering.
//!
//! # Responsibility
//! - Derive the visible gallery projection from registry contents.
//! - Keep matching and ordering rules in one place for every view.

pub mod filter;
