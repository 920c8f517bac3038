//! Multi-hop routes through an exchange chain
//!
//! A route is built hop by hop in execution order. Later hops depend on the
//! outcome of earlier ones (a quoted swap output becomes the next hop's
//! amount), so hops never run concurrently. Cancellation is checked before
//! each hop; a hop that started always finishes.

pub mod swap;

use crate::builder::types::{TransferMode, TransferPlan};
use crate::builder::{compose_transfer, validate_transfer, EncodedCall, XcmCall};
use crate::client::{ChainClient, ConnectionGuard, QuoteProvider};
use crate::config::{Feature, XcmConfig};
use crate::error::{HopRole, XcmError};
use crate::fees::{validate_chain_pair, validate_recipient, FeeEngine};
use crate::registry::{AssetInfo, ChainMeta, CurrencySpecifier, Registry, ResolvedCurrency};
use crate::types::{deserialize_u128, serialize_u128, Chain, Ecosystem};
use serde::{Deserialize, Serialize};
use swap::{
    execute_call, execution_allowance, local_swap_program, min_amount_out, net_swap_input,
    remote_stops, remote_swap_program, SwapAssets,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Hops a route is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouterMode {
    /// Origin, exchange, destination
    FullTransfer,
    ToExchange,
    FromExchange,
    /// Swap on the exchange only
    Swap,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub mode: RouterMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Chain>,
    /// Candidate exchanges in order of preference; empty means any
    #[serde(default)]
    pub exchange: Vec<Chain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Chain>,
    pub currency_from: CurrencySpecifier,
    /// Currency to swap into; without it the exchange only forwards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_to: Option<CurrencySpecifier>,
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub amount: u128,
    /// Signer on the origin chain
    pub sender: String,
    /// Final recipient
    pub recipient: String,
    /// Account on the exchange, when it differs from `sender`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage_bps: Option<u16>,
}

impl RouteRequest {
    fn exchange_account(&self) -> &str {
        self.exchange_account.as_deref().unwrap_or(&self.sender)
    }
}

/// Progress of a route, in transition order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RouteState {
    Initialized,
    OriginResolved,
    ExchangeResolved,
    DestinationResolved,
    Built,
    Validated,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    pub exchange: Chain,
    #[serde(serialize_with = "serialize_u128")]
    pub amount_in: u128,
    #[serde(serialize_with = "serialize_u128")]
    pub amount_out: u128,
    #[serde(serialize_with = "serialize_u128")]
    pub min_amount_out: u128,
}

/// One signable hop of a route
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub chain: Chain,
    pub role: HopRole,
    pub call: EncodedCall,
    /// Padded fee reported by the chain
    #[serde(serialize_with = "serialize_u128")]
    pub estimated_fee: u128,
    #[serde(serialize_with = "serialize_u128")]
    pub amount: u128,
    /// Set when the amount depends on an earlier hop's outcome
    pub amount_is_estimate: bool,
    pub amount_normalized: bool,
    pub below_existential_deposit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap: Option<SwapInfo>,
}

/// Builds routes against a registry and live collaborators
pub struct Router<'a> {
    registry: &'a Registry,
    client: &'a dyn ChainClient,
    quotes: &'a dyn QuoteProvider,
    config: &'a XcmConfig,
    fees: FeeEngine,
}

impl<'a> Router<'a> {
    pub fn new(
        registry: &'a Registry,
        client: &'a dyn ChainClient,
        quotes: &'a dyn QuoteProvider,
        config: &'a XcmConfig,
    ) -> Self {
        Router {
            registry,
            client,
            quotes,
            config,
            fees: FeeEngine::new(config),
        }
    }

    /// Build every hop of a route, in execution order
    pub async fn build_route(
        &self,
        request: &RouteRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<RouteStep>, XcmError> {
        let mut state = RouteState::Initialized;
        match self.build_steps(request, cancel, &mut state).await {
            Ok(steps) => {
                advance(&mut state, RouteState::Validated)?;
                info!(mode = ?request.mode, steps = steps.len(), "Built route");
                Ok(steps)
            }
            Err(err) => {
                fail(&mut state);
                warn!(mode = ?request.mode, error = %err, "Route failed");
                Err(err)
            }
        }
    }

    async fn build_steps(
        &self,
        request: &RouteRequest,
        cancel: &CancellationToken,
        state: &mut RouteState,
    ) -> Result<Vec<RouteStep>, XcmError> {
        if request.amount == 0 {
            return Err(XcmError::AmountTooLow(
                "amount must be greater than zero".to_string(),
            ));
        }
        if request.mode == RouterMode::Swap || request.currency_to.is_some() {
            self.config.ensure_enabled(Feature::Swap)?;
        }

        let steps = match request.mode {
            RouterMode::FullTransfer => {
                let origin = self.chain(request.origin.as_ref(), "origin")?;
                advance(state, RouteState::OriginResolved)?;
                let exchange = self.select_exchange(request, Some(origin.ecosystem))?;
                advance(state, RouteState::ExchangeResolved)?;
                let destination = self.chain(request.destination.as_ref(), "destination")?;
                advance(state, RouteState::DestinationResolved)?;

                checkpoint(cancel, HopRole::Origin)?;
                let first = match &request.currency_to {
                    Some(currency_to) => {
                        self.remote_swap_step(request, origin, exchange, currency_to)
                            .await
                    }
                    None => {
                        let plan = hop_plan(
                            origin,
                            exchange,
                            request.currency_from.clone(),
                            request.amount,
                            request.exchange_account(),
                            TransferMode::ToExchange,
                        );
                        self.transfer_step(HopRole::Origin, &plan, &request.sender, false)
                            .await
                    }
                }
                .map_err(|e| e.at_hop(HopRole::Origin, origin.name.as_str()))?;

                checkpoint(cancel, HopRole::Destination)?;
                let (currency, amount) = match (&request.currency_to, &first.swap) {
                    (Some(currency_to), Some(swap)) => (currency_to.clone(), swap.amount_out),
                    _ => (request.currency_from.clone(), first.amount),
                };
                let plan = hop_plan(
                    exchange,
                    destination,
                    currency,
                    amount,
                    &request.recipient,
                    TransferMode::FromExchange,
                );
                let second = self
                    .transfer_step(
                        HopRole::Destination,
                        &plan,
                        request.exchange_account(),
                        true,
                    )
                    .await
                    .map_err(|e| e.at_hop(HopRole::Destination, exchange.name.as_str()))?;
                vec![first, second]
            }
            RouterMode::ToExchange => {
                let origin = self.chain(request.origin.as_ref(), "origin")?;
                advance(state, RouteState::OriginResolved)?;
                let exchange = self.select_exchange(request, Some(origin.ecosystem))?;
                advance(state, RouteState::ExchangeResolved)?;

                checkpoint(cancel, HopRole::Origin)?;
                let plan = hop_plan(
                    origin,
                    exchange,
                    request.currency_from.clone(),
                    request.amount,
                    &request.recipient,
                    TransferMode::ToExchange,
                );
                let step = self
                    .transfer_step(HopRole::Origin, &plan, &request.sender, false)
                    .await
                    .map_err(|e| e.at_hop(HopRole::Origin, origin.name.as_str()))?;
                vec![step]
            }
            RouterMode::FromExchange => {
                // Candidates are limited to the destination's ecosystem
                let ecosystem = self.chain(request.destination.as_ref(), "destination")?.ecosystem;
                let exchange = self.select_exchange(request, Some(ecosystem))?;
                advance(state, RouteState::ExchangeResolved)?;
                let destination = self.chain(request.destination.as_ref(), "destination")?;
                advance(state, RouteState::DestinationResolved)?;

                checkpoint(cancel, HopRole::Destination)?;
                let plan = hop_plan(
                    exchange,
                    destination,
                    request.currency_from.clone(),
                    request.amount,
                    &request.recipient,
                    TransferMode::FromExchange,
                );
                let step = self
                    .transfer_step(HopRole::Destination, &plan, &request.sender, false)
                    .await
                    .map_err(|e| e.at_hop(HopRole::Destination, exchange.name.as_str()))?;
                vec![step]
            }
            RouterMode::Swap => {
                let currency_to = request
                    .currency_to
                    .as_ref()
                    .ok_or_else(|| XcmError::MissingParameter("currencyTo".to_string()))?;
                let exchange = self.select_exchange(request, None)?;
                advance(state, RouteState::ExchangeResolved)?;

                checkpoint(cancel, HopRole::Exchange)?;
                let step = self
                    .local_swap_step(request, exchange, currency_to)
                    .await
                    .map_err(|e| e.at_hop(HopRole::Exchange, exchange.name.as_str()))?;
                vec![step]
            }
        };

        advance(state, RouteState::Built)?;
        Ok(steps)
    }

    fn chain(&self, chain: Option<&Chain>, name: &str) -> Result<&'a ChainMeta, XcmError> {
        let chain = chain.ok_or_else(|| XcmError::MissingParameter(name.to_string()))?;
        self.registry.chain_meta(chain)
    }

    /// First candidate that is an exchange and lists both currencies
    fn select_exchange(
        &self,
        request: &RouteRequest,
        ecosystem: Option<Ecosystem>,
    ) -> Result<&'a ChainMeta, XcmError> {
        let candidates = if request.exchange.is_empty() {
            let ecosystem = ecosystem
                .ok_or_else(|| XcmError::MissingParameter("exchange".to_string()))?;
            self.registry.exchanges(ecosystem)
        } else {
            request
                .exchange
                .iter()
                .map(|chain| self.registry.chain_meta(chain))
                .collect::<Result<Vec<_>, _>>()?
        };

        let selected = candidates.into_iter().find(|candidate| {
            candidate.is_exchange
                && ecosystem.map_or(true, |e| candidate.ecosystem == e)
                && self.lists(candidate, &request.currency_from)
                && request
                    .currency_to
                    .as_ref()
                    .map_or(true, |to| self.lists(candidate, to))
        });
        match selected {
            Some(exchange) => {
                debug!(exchange = %exchange.name, "Selected exchange");
                Ok(exchange)
            }
            None => Err(XcmError::RoutingResolution(format!(
                "No exchange supports {}{}",
                request.currency_from.to_json(),
                request
                    .currency_to
                    .as_ref()
                    .map(|to| format!(" -> {}", to.to_json()))
                    .unwrap_or_default()
            ))),
        }
    }

    fn lists(&self, chain: &ChainMeta, currency: &CurrencySpecifier) -> bool {
        match currency {
            CurrencySpecifier::Symbol(symbol)
            | CurrencySpecifier::TaggedSymbol { symbol, .. } => {
                self.registry.supports_symbol(&chain.name, symbol)
            }
            other => self.registry.resolve(&chain.name, other).is_ok(),
        }
    }

    fn exchange_asset(
        &self,
        exchange: &ChainMeta,
        currency: &CurrencySpecifier,
    ) -> Result<AssetInfo, XcmError> {
        match self.registry.resolve(&exchange.name, currency)? {
            ResolvedCurrency::Registered { asset, .. } => Ok(asset),
            other => Err(XcmError::RoutingResolution(format!(
                "{} is not registered on {}",
                other.location(),
                exchange.name
            ))),
        }
    }

    /// Quote `amount_in` as it arrives on the exchange
    async fn quote_swap(
        &self,
        request: &RouteRequest,
        exchange: &ChainMeta,
        asset_in: &AssetInfo,
        currency_to: &CurrencySpecifier,
        amount_in: u128,
    ) -> Result<(SwapAssets, SwapInfo), XcmError> {
        let asset_out = self.exchange_asset(exchange, currency_to)?;
        let quote = self
            .quotes
            .quote(&exchange.name, asset_in, &asset_out, amount_in)
            .await?;
        let slippage = request.slippage_bps.unwrap_or(self.config.slippage_bps);
        let min_out = min_amount_out(quote.amount_out, slippage)?;
        debug!(
            exchange = %exchange.name,
            amount_in,
            amount_out = quote.amount_out,
            min_out,
            "Quoted swap"
        );

        let swap = SwapAssets {
            asset_in: asset_in.canonical_location(exchange)?,
            asset_out: asset_out.canonical_location(exchange)?,
            amount_in,
            min_amount_out: min_out,
            execution_fee: 0,
        };
        let info = SwapInfo {
            exchange: exchange.name.clone(),
            amount_in,
            amount_out: quote.amount_out,
            min_amount_out: min_out,
        };
        Ok((swap, info))
    }

    /// Swap carried from the origin to the exchange in one `execute`
    async fn remote_swap_step(
        &self,
        request: &RouteRequest,
        origin: &ChainMeta,
        exchange: &ChainMeta,
        currency_to: &CurrencySpecifier,
    ) -> Result<RouteStep, XcmError> {
        validate_chain_pair(origin, exchange)?;
        let beneficiary = validate_recipient(exchange, request.exchange_account())?;
        let held = self.registry.resolve(&origin.name, &request.currency_from)?;
        let asset_in = self.exchange_asset(exchange, &request.currency_from)?;

        // Execution on the way is paid out of the input
        let stops = remote_stops(origin, exchange, held.location())?;
        let net = net_swap_input(request.amount, stops)?;
        let (mut swap, info) = self
            .quote_swap(request, exchange, &asset_in, currency_to, net)
            .await?;
        swap.asset_in = held.location().clone();
        swap.amount_in = request.amount;
        swap.execution_fee = execution_allowance(request.amount);

        let program = remote_swap_program(origin, exchange, &swap, beneficiary)?;
        let version = self
            .config
            .xcm_version
            .min(origin.max_xcm_version)
            .min(exchange.max_xcm_version);
        let call = execute_call(origin, &program, version, &self.config.max_execute_weight)?;
        self.step(HopRole::Origin, origin, &call, &request.sender, request.amount)
            .await
            .map(|step| RouteStep {
                swap: Some(info),
                ..step
            })
    }

    /// Swap on the exchange, from and to the exchange account
    async fn local_swap_step(
        &self,
        request: &RouteRequest,
        exchange: &ChainMeta,
        currency_to: &CurrencySpecifier,
    ) -> Result<RouteStep, XcmError> {
        let beneficiary = validate_recipient(exchange, &request.recipient)?;
        let asset_in = self.exchange_asset(exchange, &request.currency_from)?;
        let (swap, info) = self
            .quote_swap(request, exchange, &asset_in, currency_to, request.amount)
            .await?;

        let program = local_swap_program(exchange, &swap, beneficiary);
        let version = self.config.xcm_version.min(exchange.max_xcm_version);
        let call = execute_call(exchange, &program, version, &self.config.max_execute_weight)?;
        self.step(HopRole::Exchange, exchange, &call, &request.sender, request.amount)
            .await
            .map(|step| RouteStep {
                swap: Some(info),
                ..step
            })
    }

    async fn transfer_step(
        &self,
        role: HopRole,
        plan: &TransferPlan,
        sender: &str,
        amount_is_estimate: bool,
    ) -> Result<RouteStep, XcmError> {
        let mut transfer = validate_transfer(plan, self.registry, self.config)?;
        let mut call = compose_transfer(&transfer)?;

        let connection = ConnectionGuard::acquire(self.client, &transfer.origin).await?;
        let mut data = connection.encode_call(&call)?;
        let estimated_fee = self
            .fees
            .estimate(&*connection, &transfer.origin, &data, sender)
            .await?;
        // The deposit has to survive the fee as well
        if transfer.account_for_fee(estimated_fee)? {
            debug!(
                chain = %transfer.origin.name,
                requested = transfer.requested_amount,
                amount = transfer.amount,
                estimated_fee,
                "Amount raised over existential deposit and fee"
            );
            call = compose_transfer(&transfer)?;
            data = connection.encode_call(&call)?;
        }
        drop(connection);

        let step = route_step(role, &transfer.origin, &call, data, estimated_fee, transfer.amount);
        Ok(RouteStep {
            amount_is_estimate,
            amount_normalized: transfer.amount_normalized,
            below_existential_deposit: transfer.below_existential_deposit,
            ..step
        })
    }

    /// Encode a hop's call and price it on the same connection
    async fn step(
        &self,
        role: HopRole,
        chain: &ChainMeta,
        call: &XcmCall,
        sender: &str,
        amount: u128,
    ) -> Result<RouteStep, XcmError> {
        let connection = ConnectionGuard::acquire(self.client, chain).await?;
        let data = connection.encode_call(call)?;
        let estimated_fee = self
            .fees
            .estimate(&*connection, chain, &data, sender)
            .await?;
        Ok(route_step(role, chain, call, data, estimated_fee, amount))
    }
}

fn route_step(
    role: HopRole,
    chain: &ChainMeta,
    call: &XcmCall,
    data: Vec<u8>,
    estimated_fee: u128,
    amount: u128,
) -> RouteStep {
    info!(
        chain = %chain.name,
        %role,
        call = %call.name(),
        size = data.len(),
        estimated_fee,
        "Built route step"
    );

    RouteStep {
        chain: chain.name.clone(),
        role,
        call: EncodedCall::new(&chain.name, call, data),
        estimated_fee,
        amount,
        amount_is_estimate: false,
        amount_normalized: false,
        below_existential_deposit: false,
        swap: None,
    }
}

/// Move forward; exchanges may resolve repeatedly
fn advance(state: &mut RouteState, next: RouteState) -> Result<(), XcmError> {
    let allowed = match next {
        RouteState::Validated => *state == RouteState::Built,
        RouteState::ExchangeResolved => *state <= RouteState::ExchangeResolved,
        RouteState::Failed => false,
        _ => *state < next && *state < RouteState::Built,
    };
    if !allowed {
        return Err(XcmError::Internal(format!(
            "route cannot move from {:?} to {:?}",
            *state, next
        )));
    }
    debug!(from = ?*state, to = ?next, "Route state");
    *state = next;
    Ok(())
}

fn fail(state: &mut RouteState) {
    debug!(from = ?*state, "Route state Failed");
    *state = RouteState::Failed;
}

fn checkpoint(cancel: &CancellationToken, role: HopRole) -> Result<(), XcmError> {
    if cancel.is_cancelled() {
        return Err(XcmError::Cancelled(role));
    }
    Ok(())
}

fn hop_plan(
    from: &ChainMeta,
    to: &ChainMeta,
    currency: CurrencySpecifier,
    amount: u128,
    address: &str,
    mode: TransferMode,
) -> TransferPlan {
    TransferPlan {
        from: from.name.clone(),
        to: to.name.clone(),
        currency,
        amount,
        address: address.to_string(),
        mode,
        xcm_version: None,
        fee_asset: None,
        skip_ed_normalization: false,
        custom_pallet: None,
    }
}
