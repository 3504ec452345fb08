//! # Attendance NFT contract layer
//!
//! Invocation layer for the attendance NFT ink! contract. Application
//! code calls named contract operations through a typed [`Client`]
//! without caring whether a live chain connection and deployed contract
//! are available.
//!
//! ## Architecture
//!
//! - **Metadata**: parse the contract description once per process and
//!   resolve logical method names to selectors
//! - **Caller**: route mutating calls through the signing path and
//!   reads through state queries
//! - **Simulated ledger**: a mutex-guarded in-memory contract that
//!   serves every call the real path cannot complete
//!
//! ## Fallback model
//!
//! Any failure along the real path (unreachable RPC, undecodable
//! address, missing metadata, rejected submission) lands in the
//! simulated ledger instead of surfacing to the caller. Once a client
//! is constructed, the only hard errors are malformed arguments and
//! unknown method names. Degraded operation is visible in logs and via
//! [`Client::is_simulated`], never in returned errors.

#![forbid(unsafe_code)]
#![deny(clippy::all, rust_2018_idioms)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // Intentional numeric casts - ledger ids and counts are bounded
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    // must_use on every fn is excessive
    clippy::must_use_candidate
)]

pub mod client;
pub mod config;
pub mod contract;
pub mod types;

pub use client::Client;
pub use config::AppConfig;
pub use contract::ledger::SimulatedLedger;
pub use contract::metadata::{ContractMetadata, MethodDescriptor};
pub use contract::{ContractCaller, ContractError, ContractResult};
pub use types::{AccountId, Event, Nft};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
