//! Shared fixtures for unit tests

use crate::builder::calls::XcmCall;
use crate::client::{ChainClient, ChainConnection, Quote, QuoteProvider};
use crate::error::XcmError;
use crate::fees::PaymentInfo;
use crate::registry::{AssetInfo, ChainMeta, Registry};
use crate::types::Chain;
use crate::xcm::Weight;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Substrate test account (generic prefix)
pub const ALICE: &str = "5EGoFA95omzemRssELLDjVenNZ68aXyUeqtKQScXSEBvVJkr";

pub const EVM_ALICE: &str = "0x1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d";

const FIXTURE_REGISTRY: &str = r#"{
  "chains": [
    {
      "name": "Polkadot", "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "DOT",
      "xcmPallet": "XcmPallet", "maxXcmVersion": "V5",
      "supportedPallets": ["XcmPallet", "Utility", "Sudo", "Hrmp", "ParasSudoWrapper"],
      "providers": ["ws://polkadot"],
      "nativeAssets": [{ "symbol": "DOT", "decimals": 10, "isNative": true, "existentialDeposit": "10000000000" }]
    },
    {
      "name": "AssetHubPolkadot", "paraId": 1000, "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "DOT",
      "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V5", "isSystemChain": true,
      "supportedPallets": ["PolkadotXcm", "Utility"],
      "nativeAssets": [{ "symbol": "DOT", "decimals": 10, "isNative": true,
                         "location": { "parents": 1, "interior": "Here" }, "existentialDeposit": "100000000" }],
      "otherAssets": [{ "symbol": "USDT", "decimals": 6, "assetId": "1984",
                        "location": { "parents": 0, "interior": { "X2": [{ "PalletInstance": 50 }, { "GeneralIndex": 1984 }] } } }]
    },
    {
      "name": "PeoplePolkadot", "paraId": 1004, "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "DOT",
      "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V5", "isSystemChain": true,
      "supportedPallets": ["PolkadotXcm", "Utility", "Identity"],
      "nativeAssets": [{ "symbol": "DOT", "decimals": 10, "isNative": true,
                         "location": { "parents": 1, "interior": "Here" } }]
    },
    {
      "name": "ChainA", "paraId": 2000, "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "AAA",
      "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V4",
      "supportedPallets": ["PolkadotXcm", "Utility"],
      "nativeAssets": [{ "symbol": "AAA", "decimals": 12, "isNative": true, "existentialDeposit": "1000" }],
      "otherAssets": [
        { "symbol": "DOT", "decimals": 10, "isFeeAsset": true, "existentialDeposit": "50",
          "location": { "parents": 1, "interior": "Here" } },
        { "symbol": "LOC", "decimals": 8, "assetId": "7" },
        { "symbol": "BUSD", "decimals": 6, "assetId": "90",
          "location": { "parents": 1, "interior": { "X2": [{ "Parachain": 3000 }, { "GeneralIndex": 1 }] } } },
        { "symbol": "USDT", "decimals": 6, "assetId": "1984",
          "location": { "parents": 1, "interior": { "X3": [{ "Parachain": 1000 }, { "PalletInstance": 50 }, { "GeneralIndex": 1984 }] } } }
      ]
    },
    {
      "name": "ChainB", "paraId": 2030, "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "BBB",
      "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V4",
      "supportedPallets": ["PolkadotXcm"],
      "nativeAssets": [{ "symbol": "BBB", "decimals": 12, "isNative": true }],
      "otherAssets": [
        { "symbol": "DOT", "decimals": 10, "existentialDeposit": "100",
          "location": { "parents": 1, "interior": "Here" } },
        { "symbol": "USDT", "decimals": 6, "existentialDeposit": "10",
          "location": { "parents": 1, "interior": { "X3": [{ "Parachain": 1000 }, { "PalletInstance": 50 }, { "GeneralIndex": 1984 }] } } },
        { "symbol": "BUSD", "decimals": 6, "assetId": "76", "existentialDeposit": "5",
          "location": { "parents": 0, "interior": { "X1": [{ "GeneralIndex": 76 }] } } },
        { "symbol": "BUSD", "assetId": "77" },
        { "symbol": "NODEC", "assetId": "78" },
        { "symbol": "USDC", "decimals": 6, "assetId": "81", "existentialDeposit": "3" }
      ]
    },
    {
      "name": "ChainX", "paraId": 2034, "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "XTK",
      "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V4", "isExchange": true,
      "supportedPallets": ["PolkadotXcm", "Utility"],
      "nativeAssets": [{ "symbol": "XTK", "decimals": 12, "isNative": true }],
      "otherAssets": [
        { "symbol": "DOT", "decimals": 10, "assetId": "5", "isFeeAsset": true,
          "location": { "parents": 1, "interior": "Here" } },
        { "symbol": "USDT", "decimals": 6, "assetId": "10",
          "location": { "parents": 1, "interior": { "X3": [{ "Parachain": 1000 }, { "PalletInstance": 50 }, { "GeneralIndex": 1984 }] } } },
        { "symbol": "USDC", "decimals": 6, "assetId": "22" },
        { "symbol": "BUSD", "decimals": 6, "assetId": "30",
          "location": { "parents": 1, "interior": { "X2": [{ "Parachain": 2030 }, { "GeneralIndex": 76 }] } } },
        { "symbol": "USDC", "decimals": 6, "assetId": "21", "alias": "USDC.wh",
          "location": { "parents": 1, "interior": { "X2": [{ "Parachain": 2004 }, { "GeneralIndex": 21 }] } } }
      ]
    },
    {
      "name": "ChainY", "paraId": 2035, "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "YYY",
      "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V4", "isExchange": true,
      "supportedPallets": ["PolkadotXcm"],
      "nativeAssets": [{ "symbol": "YYY", "decimals": 12, "isNative": true }],
      "otherAssets": [
        { "symbol": "DOT", "decimals": 10, "location": { "parents": 1, "interior": "Here" } }
      ]
    },
    {
      "name": "ChainE", "paraId": 2070, "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "EEE", "accountScheme": "evm",
      "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V4",
      "supportedPallets": ["PolkadotXcm"],
      "nativeAssets": [{ "symbol": "EEE", "decimals": 18, "isNative": true }],
      "otherAssets": [
        { "symbol": "xcDOT", "decimals": 10, "location": { "parents": 1, "interior": "Here" } }
      ]
    },
    {
      "name": "ChainT", "paraId": 2060, "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "TTT",
      "xcmPallet": "XTokens", "maxXcmVersion": "V3",
      "supportedPallets": ["XTokens", "Utility"],
      "nativeAssets": [{ "symbol": "TTT", "decimals": 12, "isNative": true }],
      "otherAssets": [
        { "symbol": "DOT", "decimals": 10, "isFeeAsset": true, "location": { "parents": 1, "interior": "Here" } }
      ]
    },
    {
      "name": "ChainZ", "paraId": 2050, "ecosystem": "Polkadot",
      "relayChainSymbol": "DOT", "nativeAssetSymbol": "ZZZ",
      "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V4", "supportsPaymentInfo": false,
      "supportedPallets": ["PolkadotXcm"],
      "nativeAssets": [{ "symbol": "ZZZ", "decimals": 12, "isNative": true }],
      "otherAssets": [
        { "symbol": "DOT", "decimals": 10, "location": { "parents": 1, "interior": "Here" } }
      ]
    },
    {
      "name": "Kusama", "ecosystem": "Kusama",
      "relayChainSymbol": "KSM", "nativeAssetSymbol": "KSM",
      "xcmPallet": "XcmPallet", "maxXcmVersion": "V5",
      "supportedPallets": ["XcmPallet", "Utility", "Sudo", "Hrmp", "ParasSudoWrapper"],
      "nativeAssets": [{ "symbol": "KSM", "decimals": 12, "isNative": true }]
    },
    {
      "name": "ChainK", "paraId": 2001, "ecosystem": "Kusama",
      "relayChainSymbol": "KSM", "nativeAssetSymbol": "KKK",
      "xcmPallet": "PolkadotXcm", "maxXcmVersion": "V4",
      "supportedPallets": ["PolkadotXcm"],
      "nativeAssets": [{ "symbol": "KKK", "decimals": 12, "isNative": true }],
      "otherAssets": [
        { "symbol": "KSM", "decimals": 12, "location": { "parents": 1, "interior": "Here" } }
      ]
    }
  ]
}"#;

pub fn fixture_registry() -> Registry {
    Registry::from_json(FIXTURE_REGISTRY).unwrap()
}

/// Connection that "encodes" a call as its readable form
pub struct MockConnection {
    chain: Chain,
    fee: u128,
}

impl MockConnection {
    pub fn new(chain: &str, fee: u128) -> Self {
        MockConnection {
            chain: Chain::from(chain),
            fee,
        }
    }
}

#[async_trait]
impl ChainConnection for MockConnection {
    fn encode_call(&self, call: &XcmCall) -> Result<Vec<u8>, XcmError> {
        Ok(format!("{}@{}{}", call.name(), self.chain, call.parameters()).into_bytes())
    }

    async fn payment_info(&self, _call: &[u8], _sender: &str) -> Result<PaymentInfo, XcmError> {
        Ok(PaymentInfo {
            weight: Weight::from_ref_time(1_000_000),
            partial_fee: self.fee,
        })
    }
}

/// Decode what [`MockConnection`] produced
pub fn mock_call_text(data: &[u8]) -> String {
    String::from_utf8(data.to_vec()).unwrap()
}

/// Client handing out [`MockConnection`]s and recording usage
pub struct MockClient {
    fee: u128,
    unavailable: Vec<Chain>,
    connects: Mutex<Vec<Chain>>,
    releases: Mutex<Vec<Chain>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::with_fee(1_000)
    }

    pub fn with_fee(fee: u128) -> Self {
        MockClient {
            fee,
            unavailable: Vec::new(),
            connects: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable(mut self, chain: &str) -> Self {
        self.unavailable.push(Chain::from(chain));
        self
    }

    pub fn connected(&self) -> Vec<Chain> {
        self.connects.lock().unwrap().clone()
    }

    pub fn open_handles(&self) -> usize {
        self.connects.lock().unwrap().len() - self.releases.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainClient for MockClient {
    async fn connect(&self, chain: &ChainMeta) -> Result<Arc<dyn ChainConnection>, XcmError> {
        if self.unavailable.contains(&chain.name) {
            return Err(XcmError::ProviderUnavailable(chain.name.to_string()));
        }
        self.connects.lock().unwrap().push(chain.name.clone());
        Ok(Arc::new(MockConnection::new(chain.name.as_str(), self.fee)))
    }

    fn release(&self, chain: &Chain) {
        self.releases.lock().unwrap().push(chain.clone());
    }
}

/// Quotes `amount_in * numerator / denominator`
pub struct FixedQuote {
    pub numerator: u128,
    pub denominator: u128,
}

impl FixedQuote {
    pub fn one_to_one() -> Self {
        FixedQuote {
            numerator: 1,
            denominator: 1,
        }
    }
}

#[async_trait]
impl QuoteProvider for FixedQuote {
    async fn quote(
        &self,
        _exchange: &Chain,
        _asset_in: &AssetInfo,
        _asset_out: &AssetInfo,
        amount_in: u128,
    ) -> Result<Quote, XcmError> {
        Ok(Quote {
            amount_out: amount_in * self.numerator / self.denominator,
        })
    }
}
