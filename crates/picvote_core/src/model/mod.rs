//! Gallery domain model.
//!
//! # Responsibility
//! - Define candidates, the local user and the vote ledger.
//! - Own the in-memory candidate registry and its seed data.
//!
//! # Invariants
//! - Vote counts never decrease.
//! - The ledger records each candidate at most once.

pub mod candidate;
pub mod registry;
pub mod seed;
pub mod user;
pub mod vote_ledger;
