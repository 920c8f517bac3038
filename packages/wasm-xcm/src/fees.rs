//! Fee estimation and transfer validation
//!
//! All amounts are `u128`; nothing here goes through floating point.

use crate::address::beneficiary_junction;
use crate::client::ChainConnection;
use crate::config::XcmConfig;
use crate::error::XcmError;
use crate::location::Junction;
use crate::registry::{ChainMeta, CurrencySpecifier, Registry, ResolvedCurrency};
use crate::types::{deserialize_u128, serialize_u128, Chain};
use crate::xcm::Weight;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Chain-reported payment information for a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    #[serde(default)]
    pub weight: Weight,
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub partial_fee: u128,
}

/// Outcome of the existential deposit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositCheck {
    pub amount: u128,
    /// Amount was raised to clear the deposit
    pub normalized: bool,
    /// Amount was kept although it does not clear the deposit
    pub below_existential_deposit: bool,
}

/// Balances and fees the caller already knows for one transfer
///
/// Amounts are in the currency's smallest unit. Fees are those of the
/// transfer's own hops, as estimated by the router.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountQuery {
    pub origin: Chain,
    pub destination: Chain,
    pub currency: CurrencySpecifier,
    /// Sender balance of the currency on the origin
    #[serde(
        default,
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub balance: u128,
    /// Recipient balance of the currency on the destination
    #[serde(
        default,
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub destination_balance: u128,
    #[serde(
        default,
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub origin_fee: u128,
    #[serde(
        default,
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub destination_fee: u128,
}

/// Per-hop fee estimation
#[derive(Debug, Clone, Copy)]
pub struct FeeEngine {
    padding_pct: u8,
}

impl FeeEngine {
    pub fn new(config: &XcmConfig) -> Self {
        FeeEngine {
            padding_pct: config.fee_padding_pct,
        }
    }

    pub fn pad(&self, fee: u128) -> u128 {
        fee.saturating_add(fee.saturating_mul(self.padding_pct as u128) / 100)
    }

    /// Padded fee of `call` on `chain`
    pub async fn estimate(
        &self,
        connection: &dyn ChainConnection,
        chain: &ChainMeta,
        call: &[u8],
        sender: &str,
    ) -> Result<u128, XcmError> {
        if !chain.supports_payment_info {
            return Err(XcmError::RuntimeApiUnavailable(format!(
                "{} does not expose payment info",
                chain.name
            )));
        }
        let info = connection.payment_info(call, sender).await?;
        let fee = self.pad(info.partial_fee);
        debug!(
            chain = %chain.name,
            partial_fee = info.partial_fee,
            padded = fee,
            ref_time = info.weight.ref_time,
            "Estimated fee"
        );
        Ok(fee)
    }
}

/// Check that `amount` minus `fee` clears the existential deposit
///
/// Short amounts are raised to `ed + fee` unless `skip` is set, in which
/// case they are kept and flagged.
pub fn check_existential_deposit(
    amount: u128,
    fee: u128,
    existential_deposit: Option<u128>,
    skip: bool,
) -> Result<DepositCheck, XcmError> {
    if amount == 0 {
        return Err(XcmError::AmountTooLow("amount must be greater than zero".to_string()));
    }

    let unchanged = DepositCheck {
        amount,
        normalized: false,
        below_existential_deposit: false,
    };
    let Some(ed) = existential_deposit else {
        return Ok(unchanged);
    };

    let required = required_amount(fee, ed);
    if amount >= required {
        return Ok(unchanged);
    }

    if skip {
        warn!(amount, required, "Amount below existential deposit kept as requested");
        return Ok(DepositCheck {
            below_existential_deposit: true,
            ..unchanged
        });
    }

    warn!(amount, required, "Raising amount to existential deposit");
    Ok(DepositCheck {
        amount: required,
        normalized: true,
        below_existential_deposit: false,
    })
}

fn required_amount(fee: u128, existential_deposit: u128) -> u128 {
    existential_deposit.saturating_add(fee)
}

/// Deposit a delivery has to clear on the destination
///
/// An account already holding the deposit only has to receive something.
fn destination_floor(existential_deposit: Option<u128>, destination_balance: u128) -> u128 {
    match existential_deposit {
        Some(ed) if destination_balance < ed => ed,
        _ => 1,
    }
}

/// Origin fees are taken from the transferred currency only when it is native
pub fn pays_fee_in(currency: &ResolvedCurrency) -> bool {
    currency.asset().is_some_and(|asset| asset.is_native)
}

/// What can leave `balance` without reaping the sender
///
/// `fee_in_asset` is the origin fee when it is paid in the same currency.
pub fn transferable_amount(
    balance: u128,
    existential_deposit: Option<u128>,
    fee_in_asset: u128,
) -> u128 {
    balance
        .saturating_sub(existential_deposit.unwrap_or(0))
        .saturating_sub(fee_in_asset)
}

/// Smallest amount that pays `fees` and clears the destination deposit
pub fn min_transferable_amount(
    fees: &[u128],
    existential_deposit: Option<u128>,
    destination_balance: u128,
) -> u128 {
    let fee = fees.iter().fold(0u128, |sum, fee| sum.saturating_add(*fee));
    required_amount(fee, destination_floor(existential_deposit, destination_balance))
}

/// Whether `amount` still clears the destination deposit after its fee
pub fn verify_ed_on_destination(
    amount: u128,
    destination_fee: u128,
    existential_deposit: Option<u128>,
    destination_balance: u128,
) -> bool {
    let floor = destination_floor(existential_deposit, destination_balance);
    amount >= required_amount(destination_fee, floor)
}

/// [`transferable_amount`] with deposits taken from the registry
pub fn query_transferable_amount(
    registry: &Registry,
    query: &AmountQuery,
) -> Result<u128, XcmError> {
    let currency = registry.resolve(&query.origin, &query.currency)?;
    let existential_deposit = registry.existential_deposit(&query.origin, &currency)?;
    let fee_in_asset = if pays_fee_in(&currency) { query.origin_fee } else { 0 };
    let amount = transferable_amount(query.balance, existential_deposit, fee_in_asset);
    debug!(
        origin = %query.origin,
        balance = query.balance,
        ?existential_deposit,
        fee_in_asset,
        amount,
        "Transferable amount"
    );
    Ok(amount)
}

/// [`min_transferable_amount`] with deposits taken from the registry
pub fn query_min_transferable_amount(
    registry: &Registry,
    query: &AmountQuery,
) -> Result<u128, XcmError> {
    let currency = registry.resolve(&query.origin, &query.currency)?;
    let existential_deposit = registry.existential_deposit(&query.destination, &currency)?;
    let origin_fee = if pays_fee_in(&currency) { query.origin_fee } else { 0 };
    Ok(min_transferable_amount(
        &[origin_fee, query.destination_fee],
        existential_deposit,
        query.destination_balance,
    ))
}

/// [`verify_ed_on_destination`] with the deposit taken from the registry
pub fn query_verify_ed_on_destination(
    registry: &Registry,
    query: &AmountQuery,
    amount: u128,
) -> Result<bool, XcmError> {
    let currency = registry.resolve(&query.origin, &query.currency)?;
    let existential_deposit = registry.existential_deposit(&query.destination, &currency)?;
    let verified = verify_ed_on_destination(
        amount,
        query.destination_fee,
        existential_deposit,
        query.destination_balance,
    );
    if !verified {
        warn!(
            destination = %query.destination,
            amount,
            destination_fee = query.destination_fee,
            ?existential_deposit,
            "Delivery would not clear the existential deposit"
        );
    }
    Ok(verified)
}

/// Recipient must be well-formed for the chain's account scheme
pub fn validate_recipient(chain: &ChainMeta, address: &str) -> Result<Junction, XcmError> {
    beneficiary_junction(address, chain.account_scheme).map_err(|e| {
        XcmError::InvalidAddress(format!(
            "{} is not a valid {:?} address for {}: {}",
            address, chain.account_scheme, chain.name, e
        ))
    })
}

/// Origin and destination must differ and share a consensus or a bridge
pub fn validate_chain_pair(origin: &ChainMeta, destination: &ChainMeta) -> Result<(), XcmError> {
    if origin.name == destination.name {
        return Err(XcmError::InvalidParameter(format!(
            "Origin and destination are both {}",
            origin.name
        )));
    }
    if origin.is_relay() && destination.is_relay() {
        return Err(XcmError::IncompatibleChains(format!(
            "Relay chain {} cannot transfer directly to relay chain {}",
            origin.name, destination.name
        )));
    }
    if origin.ecosystem != destination.ecosystem && !origin.is_bridged_to(&destination.name) {
        return Err(XcmError::IncompatibleChains(format!(
            "{} ({:?}) and {} ({:?}) are not bridged",
            origin.name, origin.ecosystem, destination.name, destination.ecosystem
        )));
    }
    Ok(())
}

/// The chain must expose the pallet a call is routed through
pub fn validate_pallet(chain: &ChainMeta, pallet: &str) -> Result<(), XcmError> {
    if !chain.supports_pallet(pallet) {
        return Err(XcmError::ChainNotSupported(format!(
            "{} does not support pallet {}",
            chain.name, pallet
        )));
    }
    Ok(())
}

/// The destination must register the transferred symbol
pub fn validate_destination_asset(
    registry: &Registry,
    destination: &ChainMeta,
    symbol: &str,
) -> Result<(), XcmError> {
    if !registry.supports_symbol(&destination.name, symbol) {
        return Err(XcmError::InvalidCurrency(format!(
            "{} does not support asset {}",
            destination.name, symbol
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::{fixture_registry, MockConnection, ALICE, EVM_ALICE};
    use crate::types::Chain;
    use rstest::rstest;

    #[rstest]
    #[case(1000, 0, Some(100), false, 1000, false, false)]
    #[case(50, 0, Some(100), false, 100, true, false)]
    #[case(50, 0, Some(100), true, 50, false, true)]
    #[case(105, 10, Some(100), false, 110, true, false)]
    #[case(50, 0, None, false, 50, false, false)]
    fn test_existential_deposit(
        #[case] amount: u128,
        #[case] fee: u128,
        #[case] ed: Option<u128>,
        #[case] skip: bool,
        #[case] expected: u128,
        #[case] normalized: bool,
        #[case] below: bool,
    ) {
        let check = check_existential_deposit(amount, fee, ed, skip).unwrap();
        assert_eq!(check.amount, expected);
        assert_eq!(check.normalized, normalized);
        assert_eq!(check.below_existential_deposit, below);
    }

    #[rstest]
    #[case(1_000, Some(100), 200, 700)]
    #[case(100, Some(100), 50, 0)]
    #[case(1_000, None, 0, 1_000)]
    fn test_transferable_amount(
        #[case] balance: u128,
        #[case] ed: Option<u128>,
        #[case] fee: u128,
        #[case] expected: u128,
    ) {
        assert_eq!(transferable_amount(balance, ed, fee), expected);
    }

    #[rstest]
    #[case(&[1_200, 300], Some(100), 0, 1_600)]
    #[case(&[1_200, 300], Some(100), 500, 1_501)]
    #[case(&[1_200, 300], Some(100), 50, 1_600)]
    #[case(&[], None, 0, 1)]
    #[case(&[u128::MAX, 1], Some(1), 0, u128::MAX)]
    fn test_min_transferable_amount(
        #[case] fees: &[u128],
        #[case] ed: Option<u128>,
        #[case] destination_balance: u128,
        #[case] expected: u128,
    ) {
        assert_eq!(min_transferable_amount(fees, ed, destination_balance), expected);
    }

    #[rstest]
    #[case(1_300, 1_200, Some(100), 0, true)]
    #[case(1_299, 1_200, Some(100), 0, false)]
    #[case(1_201, 1_200, Some(100), 500, true)]
    #[case(1_200, 1_200, Some(100), 500, false)]
    #[case(1, 0, None, 0, true)]
    fn test_verify_ed_on_destination(
        #[case] amount: u128,
        #[case] fee: u128,
        #[case] ed: Option<u128>,
        #[case] destination_balance: u128,
        #[case] expected: bool,
    ) {
        assert_eq!(verify_ed_on_destination(amount, fee, ed, destination_balance), expected);
    }

    #[test]
    fn test_min_transferable_passes_deposit_check() {
        let minimum = min_transferable_amount(&[1_200], Some(100), 0);
        let check = check_existential_deposit(minimum, 1_200, Some(100), true).unwrap();
        assert!(!check.below_existential_deposit);
        assert!(verify_ed_on_destination(minimum, 1_200, Some(100), 0));
        assert!(!verify_ed_on_destination(minimum - 1, 1_200, Some(100), 0));
    }

    fn query(origin: &str, destination: &str, symbol: &str) -> AmountQuery {
        AmountQuery {
            origin: Chain::from(origin),
            destination: Chain::from(destination),
            currency: CurrencySpecifier::symbol(symbol),
            balance: 10_000,
            destination_balance: 0,
            origin_fee: 1_200,
            destination_fee: 300,
        }
    }

    #[rstest]
    // Native AAA pays the origin fee and keeps 1000 behind
    #[case("AAA", 7_800)]
    // DOT on ChainA keeps 50; the fee is paid in AAA
    #[case("DOT", 9_950)]
    fn test_query_transferable_amount(#[case] symbol: &str, #[case] expected: u128) {
        let registry = fixture_registry();
        let amount = query_transferable_amount(&registry, &query("ChainA", "ChainB", symbol));
        assert_eq!(amount.unwrap(), expected);
    }

    #[test]
    fn test_query_destination_deposit() {
        let registry = fixture_registry();
        let q = query("ChainA", "ChainB", "DOT");
        // Destination fee 300 plus ChainB's DOT deposit of 100
        assert_eq!(query_min_transferable_amount(&registry, &q).unwrap(), 400);
        assert!(query_verify_ed_on_destination(&registry, &q, 400).unwrap());
        assert!(!query_verify_ed_on_destination(&registry, &q, 399).unwrap());

        let funded = AmountQuery {
            destination_balance: 100,
            ..q
        };
        assert_eq!(query_min_transferable_amount(&registry, &funded).unwrap(), 301);
        assert!(query_verify_ed_on_destination(&registry, &funded, 301).unwrap());
    }

    #[test]
    fn test_query_ambiguous_destination_asset() {
        let registry = fixture_registry();
        let err = query_min_transferable_amount(&registry, &query("ChainA", "ChainB", "BUSD"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateAsset);
    }

    #[test]
    fn test_amount_query_from_json() {
        let json = r#"{
            "origin": "ChainA",
            "destination": "ChainB",
            "currency": { "symbol": "DOT" },
            "balance": "10000",
            "destinationFee": 300
        }"#;
        let q: AmountQuery = serde_json::from_str(json).unwrap();
        assert_eq!(q.balance, 10_000);
        assert_eq!(q.destination_fee, 300);
        assert_eq!(q.origin_fee, 0);
        assert_eq!(q.destination_balance, 0);
    }

    #[test]
    fn test_zero_amount_too_low() {
        let err = check_existential_deposit(0, 0, Some(1), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmountTooLow);
    }

    #[test]
    fn test_padding() {
        let engine = FeeEngine::new(&XcmConfig::default());
        assert_eq!(engine.pad(100), 120);
        assert_eq!(engine.pad(u128::MAX), u128::MAX);
    }

    #[tokio::test]
    async fn test_estimate_pads_reported_fee() {
        let registry = fixture_registry();
        let chain = registry.chain_meta(&Chain::from("ChainA")).unwrap();
        let connection = MockConnection::new("ChainA", 1_000);
        let engine = FeeEngine::new(&XcmConfig::default());

        let fee = engine.estimate(&connection, chain, &[1, 2], ALICE).await.unwrap();
        assert_eq!(fee, 1_200);
    }

    #[tokio::test]
    async fn test_estimate_without_payment_api() {
        let registry = fixture_registry();
        let chain = registry.chain_meta(&Chain::from("ChainZ")).unwrap();
        let connection = MockConnection::new("ChainZ", 1_000);
        let engine = FeeEngine::new(&XcmConfig::default());

        let err = engine
            .estimate(&connection, chain, &[1], ALICE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RuntimeApiUnavailable);
    }

    #[test]
    fn test_payment_info_from_rpc_json() {
        let info: PaymentInfo = serde_json::from_str(
            r#"{ "weight": { "refTime": 150000000, "proofSize": 3593 }, "partialFee": "15800000000" }"#,
        )
        .unwrap();
        assert_eq!(info.partial_fee, 15_800_000_000);
        assert_eq!(info.weight.proof_size, 3593);
    }

    #[test]
    fn test_chain_pair_rules() {
        let registry = fixture_registry();
        let meta = |name: &str| registry.chain_meta(&Chain::from(name)).unwrap();

        assert!(validate_chain_pair(meta("ChainA"), meta("ChainB")).is_ok());
        assert_eq!(
            validate_chain_pair(meta("ChainA"), meta("ChainA")).unwrap_err().kind(),
            ErrorKind::InvalidParameter
        );
        assert_eq!(
            validate_chain_pair(meta("ChainA"), meta("ChainK")).unwrap_err().kind(),
            ErrorKind::IncompatibleChains
        );
        assert_eq!(
            validate_chain_pair(meta("Polkadot"), meta("Kusama")).unwrap_err().kind(),
            ErrorKind::IncompatibleChains
        );
    }

    #[test]
    fn test_recipient_scheme() {
        let registry = fixture_registry();
        let evm = registry.chain_meta(&Chain::from("ChainE")).unwrap();
        assert!(validate_recipient(evm, EVM_ALICE).is_ok());
        let err = validate_recipient(evm, ALICE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);
        assert!(err.to_string().contains("ChainE"));
    }

    #[test]
    fn test_pallet_and_destination_asset() {
        let registry = fixture_registry();
        let chain_b = registry.chain_meta(&Chain::from("ChainB")).unwrap();
        assert!(validate_pallet(chain_b, "PolkadotXcm").is_ok());
        assert_eq!(
            validate_pallet(chain_b, "XTokens").unwrap_err().kind(),
            ErrorKind::ChainNotSupported
        );
        assert!(validate_destination_asset(&registry, chain_b, "DOT").is_ok());
        assert_eq!(
            validate_destination_asset(&registry, chain_b, "XTK").unwrap_err().kind(),
            ErrorKind::InvalidCurrency
        );
    }
}
