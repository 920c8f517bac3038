//! Error types for wasm-xcm
//!
//! Every failure carries a stable [`ErrorKind`] and an [`ErrorClass`] so the
//! collaborator layer can map caller mistakes and system faults separately.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use wasm_bindgen::prelude::*;

/// Role of a hop inside a multi-hop route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HopRole {
    Origin,
    Exchange,
    Destination,
}

impl fmt::Display for HopRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HopRole::Origin => "origin",
            HopRole::Exchange => "exchange",
            HopRole::Destination => "destination",
        };
        f.write_str(s)
    }
}

/// Main error type for wasm-xcm operations
#[derive(Debug, Clone, Error)]
pub enum XcmError {
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),
    #[error("Duplicate asset: symbol {symbol} matches {matches} assets on {chain}")]
    DuplicateAsset {
        symbol: String,
        chain: String,
        matches: usize,
    },
    #[error("Chain not supported: {0}")]
    ChainNotSupported(String),
    #[error("Incompatible chains: {0}")]
    IncompatibleChains(String),
    #[error("Missing parameter: {0}")]
    MissingParameter(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Amount too low: {0}")]
    AmountTooLow(String),
    #[error("Routing resolution failed: {0}")]
    RoutingResolution(String),
    #[error("Batch validation failed: {0}")]
    BatchValidation(String),
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("Missing chain API: {0}")]
    MissingChainApi(String),
    #[error("Runtime API unavailable: {0}")]
    RuntimeApiUnavailable(String),
    #[error("Feature temporarily disabled: {0}")]
    FeatureDisabled(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Route cancelled before {0} hop")]
    Cancelled(HopRole),
    #[error("{role} hop on {chain} failed: {source}")]
    HopFailed {
        role: HopRole,
        chain: String,
        source: Box<XcmError>,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable, serializable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InvalidCurrency,
    DuplicateAsset,
    ChainNotSupported,
    IncompatibleChains,
    MissingParameter,
    InvalidParameter,
    InvalidAddress,
    AmountTooLow,
    RoutingResolutionFailure,
    BatchValidationFailure,
    ProviderUnavailable,
    MissingChainApi,
    RuntimeApiUnavailable,
    FeatureTemporarilyDisabled,
    Encoding,
    Cancelled,
    Internal,
}

/// Whether the caller or the system is at fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorClass {
    UserError,
    SystemFault,
}

impl XcmError {
    /// Kind of the underlying failure; hop wrappers report their source's kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            XcmError::InvalidCurrency(_) => ErrorKind::InvalidCurrency,
            XcmError::DuplicateAsset { .. } => ErrorKind::DuplicateAsset,
            XcmError::ChainNotSupported(_) => ErrorKind::ChainNotSupported,
            XcmError::IncompatibleChains(_) => ErrorKind::IncompatibleChains,
            XcmError::MissingParameter(_) => ErrorKind::MissingParameter,
            XcmError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            XcmError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            XcmError::AmountTooLow(_) => ErrorKind::AmountTooLow,
            XcmError::RoutingResolution(_) => ErrorKind::RoutingResolutionFailure,
            XcmError::BatchValidation(_) => ErrorKind::BatchValidationFailure,
            XcmError::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            XcmError::MissingChainApi(_) => ErrorKind::MissingChainApi,
            XcmError::RuntimeApiUnavailable(_) => ErrorKind::RuntimeApiUnavailable,
            XcmError::FeatureDisabled(_) => ErrorKind::FeatureTemporarilyDisabled,
            XcmError::Encoding(_) => ErrorKind::Encoding,
            XcmError::Cancelled(_) => ErrorKind::Cancelled,
            XcmError::HopFailed { source, .. } => source.kind(),
            XcmError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self.kind() {
            ErrorKind::ProviderUnavailable
            | ErrorKind::RuntimeApiUnavailable
            | ErrorKind::Encoding
            | ErrorKind::Internal => ErrorClass::SystemFault,
            _ => ErrorClass::UserError,
        }
    }

    /// Annotate an error with the hop that produced it
    pub fn at_hop(self, role: HopRole, chain: &str) -> Self {
        match self {
            // Already annotated by an inner hop
            e @ XcmError::HopFailed { .. } => e,
            e @ XcmError::Cancelled(_) => e,
            source => XcmError::HopFailed {
                role,
                chain: chain.to_string(),
                source: Box::new(source),
            },
        }
    }

    /// Role of the failing hop, if any
    pub fn hop_role(&self) -> Option<HopRole> {
        match self {
            XcmError::HopFailed { role, .. } => Some(*role),
            XcmError::Cancelled(role) => Some(*role),
            _ => None,
        }
    }
}

impl From<parity_scale_codec::Error> for XcmError {
    fn from(err: parity_scale_codec::Error) -> Self {
        XcmError::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for XcmError {
    fn from(err: serde_json::Error) -> Self {
        XcmError::InvalidParameter(err.to_string())
    }
}

// REQUIRED: Converts to JS Error with stack trace
impl From<XcmError> for JsValue {
    fn from(err: XcmError) -> Self {
        let js_err = js_sys::Error::new(&err.to_string());
        if let Ok(kind) = serde_json::to_value(err.kind()) {
            if let Some(kind) = kind.as_str() {
                js_err.set_name(kind);
            }
        }
        js_err.into()
    }
}
