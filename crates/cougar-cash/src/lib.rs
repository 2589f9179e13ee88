//! Cougar Cash: the rules engines behind a school rewards economy.
//!
//! The [`rewards`] module holds the pure engines (calendar points, redemption
//! classification, award budgets). The [`school`] module owns the application
//! state, applies engine verdicts, and persists snapshots after each mutation.

pub mod config;
pub mod error;
pub mod rewards;
pub mod school;
pub mod telemetry;
