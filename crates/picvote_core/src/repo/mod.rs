//! Persistence contracts for gallery state.
//!
//! # Responsibility
//! - Define the three-record state store contract.
//! - Isolate SQLite and JSON encoding details from controller orchestration.
//!
//! # Invariants
//! - Each record is independently keyed and fully overwritten on save.
//! - Loads report undecodable records as errors; callers decide the fallback.

pub mod state_repo;
