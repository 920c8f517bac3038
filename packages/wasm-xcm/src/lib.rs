//! wasm-xcm: cross-chain transfers between Polkadot ecosystem chains
//!
//! This crate provides:
//! - A chain and asset registry with currency resolution
//! - Location parsing and transforms between chain vantage points
//! - Call building for transfers, batches, asset claims, identity and HRMP channels
//! - Multi-hop routes through exchange chains, with fee estimates
//!
//! # Architecture
//!
//! The crate follows a two-layer architecture:
//! - **Core layer** (`src/*.rs`): Pure Rust logic, no WASM dependencies
//! - **WASM layer** (`src/wasm/*.rs`): Thin wrappers with `#[wasm_bindgen]`
//!
//! Chain access (metadata, fees, quotes) goes through the traits in
//! [`client`]; the core never opens connections itself.

pub mod address;
pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod fees;
pub mod location;
pub mod registry;
pub mod router;
pub mod types;
pub mod wasm;
pub mod xcm;

#[cfg(test)]
mod test_utils;

// Re-export main types for convenience
pub use address::{decode_ss58, encode_ss58, validate_address};
pub use builder::{EncodedCall, TransferBuilder, TransferPlan, XcmCall};
pub use client::{CachingClient, ChainClient, ChainConnection, QuoteProvider};
pub use config::XcmConfig;
pub use error::{ErrorClass, ErrorKind, XcmError};
pub use location::{Junction, Location};
pub use registry::{CurrencySpecifier, Registry};
pub use router::{RouteRequest, RouteStep, Router, RouterMode};
pub use types::{Chain, Ecosystem, Version};
