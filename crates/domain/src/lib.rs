//! # tally-domain
//!
//! Pure domain model for the tally command-usage tracker.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers and error conventions
//! - Define **Users** (identities supplied by the chat platform)
//! - Define **Commands** (the static set of known command names)
//! - Define **Usage** records and the per-user aggregated report
//! - Contain all invariant enforcement and domain logic (name validation,
//!   command-token extraction, report folding)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod command;
pub mod usage;
pub mod user;
