//! Domain layer for the rota shift-scheduling engine.
//!
//! This crate has zero internal dependencies so it can be consumed by
//! the persistence layer, the engine, and any future worker or CLI
//! tooling. It carries:
//!
//! - [`types`] — shared type aliases (`DbId`, `Timestamp`).
//! - [`error`] — the [`CoreError`](error::CoreError) taxonomy.
//! - [`actor`] — the identity snapshot supplied by the external
//!   identity provider.
//! - [`occurrence`] — pure weekly-recurrence expansion.
//! - [`eligibility`] — role-based eligibility gating.
//! - [`window`] — optional inclusive time windows.

pub mod actor;
pub mod eligibility;
pub mod error;
pub mod occurrence;
pub mod types;
pub mod window;

pub use actor::Actor;
pub use error::CoreError;
