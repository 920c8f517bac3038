//! Builder and router configuration

use crate::error::XcmError;
use crate::types::{deserialize_u128, serialize_u128, Version};
use crate::xcm::Weight;
use serde::{Deserialize, Serialize};

/// Features that can be switched off at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    Identity,
    Channels,
    Swap,
    Claim,
}

/// Settings shared by all builders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XcmConfig {
    /// XCM version used when a plan has no override; clamped to what both chains support
    pub xcm_version: Version,
    /// Percentage added on top of chain-reported fees
    pub fee_padding_pct: u8,
    /// Allowed swap slippage in basis points
    pub slippage_bps: u16,
    /// Keep amounts below the existential deposit instead of raising them
    pub skip_ed_normalization: bool,
    /// Fee withdrawn on the people chain when none is given
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub identity_xcm_fee: u128,
    /// Weight limit for execute-based swap programs
    pub max_execute_weight: Weight,
    pub disabled_features: Vec<Feature>,
}

impl Default for XcmConfig {
    fn default() -> Self {
        XcmConfig {
            xcm_version: Version::V4,
            fee_padding_pct: 20,
            slippage_bps: 100,
            skip_ed_normalization: false,
            identity_xcm_fee: 10_000_000_000,
            max_execute_weight: Weight {
                ref_time: 100_000_000_000,
                proof_size: 1_000_000,
            },
            disabled_features: Vec::new(),
        }
    }
}

impl XcmConfig {
    pub fn from_json(json: &str) -> Result<Self, XcmError> {
        let config: XcmConfig = serde_json::from_str(json)
            .map_err(|e| XcmError::InvalidParameter(format!("Invalid config: {}", e)))?;
        if config.slippage_bps > 10_000 {
            return Err(XcmError::InvalidParameter(format!(
                "slippageBps must be at most 10000, got {}",
                config.slippage_bps
            )));
        }
        Ok(config)
    }

    pub fn ensure_enabled(&self, feature: Feature) -> Result<(), XcmError> {
        if self.disabled_features.contains(&feature) {
            return Err(XcmError::FeatureDisabled(format!("{:?}", feature)));
        }
        Ok(())
    }
}
