//! Call building from plans
//!
//! Every builder follows the same steps: validate the plan against the
//! registry, compose a dynamic call, then encode it on the chain that will
//! execute it. Composition is pure; only encoding touches a connection.

pub mod batch;
pub mod calls;
pub mod channel;
pub mod claim;
pub mod identity;
pub mod transfer;
pub mod types;

pub use batch::{build_batch, compose_batch};
pub use calls::{EncodedCall, RuntimeEncoder, XcmCall};
pub use channel::{build_channel_close, build_channel_open};
pub use claim::{build_claim, ClaimOutput};
pub use identity::build_identity;
pub use transfer::{build_transfer, compose_transfer, validate_transfer};
pub use types::{BatchMode, TransferMode, TransferPlan, ValidatedTransfer};

use crate::client::{ChainClient, ConnectionGuard};
use crate::config::XcmConfig;
use crate::error::XcmError;
use crate::registry::{ChainMeta, CurrencySpecifier, Registry};
use crate::types::{Chain, Version};
use tracing::info;
use types::{CustomPallet, FeeAsset};

/// Encode `call` against `chain`'s runtime; the connection is released on return
pub(crate) async fn encode_on(
    client: &dyn ChainClient,
    chain: &ChainMeta,
    call: &XcmCall,
) -> Result<EncodedCall, XcmError> {
    let connection = ConnectionGuard::acquire(client, chain).await?;
    let data = connection.encode_call(call)?;
    info!(
        chain = %chain.name,
        module = %call.module,
        method = %call.method,
        size = data.len(),
        "Encoded call"
    );
    Ok(EncodedCall::new(&chain.name, call, data))
}

/// Staged transfer builder
///
/// Each setter consumes and returns the builder. Transfers from the same
/// origin can be queued with [`TransferBuilder::add_to_batch`] and encoded
/// together with [`TransferBuilder::build_batch`].
#[derive(Debug, Clone)]
pub struct TransferBuilder<'a> {
    registry: &'a Registry,
    config: &'a XcmConfig,
    from: Option<Chain>,
    to: Option<Chain>,
    currency: Option<CurrencySpecifier>,
    amount: Option<u128>,
    address: Option<String>,
    mode: TransferMode,
    xcm_version: Option<Version>,
    fee_asset: Option<FeeAsset>,
    skip_ed_normalization: bool,
    custom_pallet: Option<CustomPallet>,
    batch: Vec<ValidatedTransfer>,
}

impl<'a> TransferBuilder<'a> {
    pub fn new(registry: &'a Registry, config: &'a XcmConfig) -> Self {
        TransferBuilder {
            registry,
            config,
            from: None,
            to: None,
            currency: None,
            amount: None,
            address: None,
            mode: TransferMode::Direct,
            xcm_version: None,
            fee_asset: None,
            skip_ed_normalization: false,
            custom_pallet: None,
            batch: Vec::new(),
        }
    }

    pub fn from(mut self, chain: impl Into<Chain>) -> Self {
        self.from = Some(chain.into());
        self
    }

    pub fn to(mut self, chain: impl Into<Chain>) -> Self {
        self.to = Some(chain.into());
        self
    }

    pub fn currency(mut self, currency: CurrencySpecifier) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn amount(mut self, amount: u128) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn xcm_version(mut self, version: Version) -> Self {
        self.xcm_version = Some(version);
        self
    }

    pub fn fee_asset(mut self, currency: CurrencySpecifier, amount: u128) -> Self {
        self.fee_asset = Some(FeeAsset { currency, amount });
        self
    }

    pub fn skip_ed_normalization(mut self, skip: bool) -> Self {
        self.skip_ed_normalization = skip;
        self
    }

    pub fn custom_pallet(mut self, pallet: &str, method: &str) -> Self {
        self.custom_pallet = Some(CustomPallet {
            pallet: pallet.to_string(),
            method: method.to_string(),
        });
        self
    }

    /// Assemble the plan; fails on the first unset stage
    pub fn plan(&self) -> Result<TransferPlan, XcmError> {
        fn required<T: Clone>(value: &Option<T>, name: &str) -> Result<T, XcmError> {
            value
                .clone()
                .ok_or_else(|| XcmError::MissingParameter(name.to_string()))
        }

        Ok(TransferPlan {
            from: required(&self.from, "from")?,
            to: required(&self.to, "to")?,
            currency: required(&self.currency, "currency")?,
            amount: required(&self.amount, "amount")?,
            address: required(&self.address, "address")?,
            mode: self.mode,
            xcm_version: self.xcm_version,
            fee_asset: self.fee_asset.clone(),
            skip_ed_normalization: self.skip_ed_normalization,
            custom_pallet: self.custom_pallet.clone(),
        })
    }

    pub fn validate(&self) -> Result<ValidatedTransfer, XcmError> {
        validate_transfer(&self.plan()?, self.registry, self.config)
    }

    pub fn compose(&self) -> Result<XcmCall, XcmError> {
        compose_transfer(&self.validate()?)
    }

    /// Encode the current transfer on its origin
    pub async fn build(&self, client: &dyn ChainClient) -> Result<EncodedCall, XcmError> {
        if !self.batch.is_empty() {
            return Err(XcmError::BatchValidation(format!(
                "{} transfers are queued; use build_batch",
                self.batch.len()
            )));
        }
        let transfer = self.validate()?;
        let call = compose_transfer(&transfer)?;
        encode_on(client, &transfer.origin, &call).await
    }

    /// Queue the current transfer and clear the per-transfer stages
    pub fn add_to_batch(mut self) -> Result<Self, XcmError> {
        let transfer = self.validate()?;
        self.batch.push(transfer);
        self.to = None;
        self.currency = None;
        self.amount = None;
        self.address = None;
        self.mode = TransferMode::Direct;
        self.fee_asset = None;
        self.custom_pallet = None;
        Ok(self)
    }

    pub fn queued(&self) -> &[ValidatedTransfer] {
        &self.batch
    }

    pub async fn build_batch(
        &self,
        client: &dyn ChainClient,
        mode: BatchMode,
    ) -> Result<EncodedCall, XcmError> {
        build_batch(&self.batch, mode, client).await
    }
}
