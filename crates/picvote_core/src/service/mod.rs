//! Gallery use-case orchestration.
//!
//! # Responsibility
//! - Coordinate registry, ledger, session and collaborators per user action.
//! - Keep front ends decoupled from storage and collaborator details.

pub mod actor;
pub mod gallery_controller;
