//! # tally-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Repository`: list / get / delete shared by reference tables
//!   - `UserRepository`: add and patch-or-create users
//!   - `CommandRepository`: add commands, resolve by name
//!   - `UsageRepository`: increment counters, build the aggregated report
//! - Define **driving/inbound ports** as use-case structs:
//!   - `UserService`: ensure a user exists, register, patch, list
//!   - `CommandService`: seed known commands, resolve names
//!   - `UsageService`: record invocations, report usage
//!
//! ## Dependency rule
//! Depends on `tally-domain` only. Never imports adapter crates.
//! Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
