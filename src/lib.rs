//! Stockroom
//!
//! Client-side business-state orchestration engine for retail back-office
//! dashboards. The crate owns all mutable domain state for one authenticated
//! session, applies business rules on every mutation, computes the
//! best-applicable discount, runs checkout against live inventory, derives
//! low-stock alerts with their dependent emails, and keeps the shopping cart
//! consistent with changing stock levels.
//!
//! Persistence belongs to an external REST backend, reached through the
//! injectable [`gateway::RemoteGateway`] trait. Local state changes only
//! after the corresponding gateway call resolves.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use engine::Engine;
pub use errors::ServiceError;
pub use state::{SessionState, StateStore};
