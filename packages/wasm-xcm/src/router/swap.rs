//! XCM programs that swap on an exchange chain
//!
//! A swap is always an `execute` call. Run on the exchange itself the program
//! withdraws, exchanges and deposits locally. Run on another chain it first
//! moves the input asset to the exchange through its reserve and carries the
//! exchange instructions along as the remote part of the program.

use crate::builder::XcmCall;
use crate::error::XcmError;
use crate::fees::validate_pallet;
use crate::location::{chain_location, localize, Junction, Location, NetworkId, Vantage};
use crate::registry::{ChainMeta, TransferPallet};
use crate::types::Version;
use crate::xcm::{
    versioned_xcm, weight_value, Asset, AssetFilter, Instruction, Weight, WeightLimit,
};

const BPS_DENOMINATOR: u128 = 10_000;

/// Share of the input offered for execution at each remote stop
pub const EXECUTION_ALLOWANCE_BPS: u128 = 500;

/// Assets and amounts of one swap, locations in canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapAssets {
    pub asset_in: Location,
    pub asset_out: Location,
    /// Withdrawn from the sender, execution allowance included
    pub amount_in: u128,
    pub min_amount_out: u128,
    /// Offered by each `BuyExecution` of a remote program
    pub execution_fee: u128,
}

/// `bps` basis points of `amount`, rounded down
fn share(amount: u128, bps: u128) -> u128 {
    // Split to avoid overflowing on large amounts
    amount / BPS_DENOMINATOR * bps + amount % BPS_DENOMINATOR * bps / BPS_DENOMINATOR
}

/// Lower bound on the swap output after slippage
pub fn min_amount_out(amount_out: u128, slippage_bps: u16) -> Result<u128, XcmError> {
    let slippage = slippage_bps as u128;
    if slippage > BPS_DENOMINATOR {
        return Err(XcmError::InvalidParameter(format!(
            "slippage must be at most {} bps, got {}",
            BPS_DENOMINATOR, slippage_bps
        )));
    }
    Ok(share(amount_out, BPS_DENOMINATOR - slippage))
}

pub fn execution_allowance(amount_in: u128) -> u128 {
    share(amount_in, EXECUTION_ALLOWANCE_BPS)
}

/// Chains that charge execution before the asset reaches the swap
///
/// The exchange always does; a reserve that is neither end adds a stop.
pub fn remote_stops(
    origin: &ChainMeta,
    exchange: &ChainMeta,
    asset_in: &Location,
) -> Result<u128, XcmError> {
    let reserve = reserve_of(asset_in, origin.network())?;
    if reserve == origin.vantage() || reserve == exchange.vantage() {
        Ok(1)
    } else {
        Ok(2)
    }
}

/// Input left for the swap once every remote stop took its allowance
pub fn net_swap_input(amount_in: u128, stops: u128) -> Result<u128, XcmError> {
    let net = amount_in.saturating_sub(execution_allowance(amount_in).saturating_mul(stops));
    if net == 0 {
        return Err(XcmError::AmountTooLow(format!(
            "{} does not cover execution on {} remote chains",
            amount_in, stops
        )));
    }
    Ok(net)
}

/// Chain holding the reserve of a canonical location
pub fn reserve_of(location: &Location, network: NetworkId) -> Result<Vantage, XcmError> {
    if location.parents == 1 {
        match location.junctions().first() {
            None => return Ok(Vantage::relay(network)),
            Some(Junction::Parachain(para_id)) => return Ok(Vantage::para(network, *para_id)),
            Some(_) => {}
        }
    }
    Err(XcmError::RoutingResolution(format!(
        "No reserve chain for {}",
        location
    )))
}

fn exchange_instructions(
    exchange: Vantage,
    swap: &SwapAssets,
    give: AssetFilter,
    beneficiary: Junction,
) -> [Instruction; 2] {
    [
        Instruction::ExchangeAsset {
            give,
            want: vec![Asset::new(
                localize(exchange, &swap.asset_out),
                swap.min_amount_out,
            )],
            maximal: false,
        },
        Instruction::DepositAsset {
            assets: AssetFilter::AllCounted(2),
            beneficiary: Location::with_junction(0, beneficiary),
        },
    ]
}

/// Program run on the exchange itself
pub fn local_swap_program(
    exchange: &ChainMeta,
    swap: &SwapAssets,
    beneficiary: Junction,
) -> Vec<Instruction> {
    let vantage = exchange.vantage();
    let give = Asset::new(localize(vantage, &swap.asset_in), swap.amount_in);

    let mut program = vec![Instruction::WithdrawAsset(vec![give.clone()])];
    program.extend(exchange_instructions(
        vantage,
        swap,
        AssetFilter::Definite(vec![give]),
        beneficiary,
    ));
    program
}

/// Program run on `origin` that swaps on `exchange`
///
/// Each remote stop buys execution with `swap.execution_fee` of the input.
pub fn remote_swap_program(
    origin: &ChainMeta,
    exchange: &ChainMeta,
    swap: &SwapAssets,
    beneficiary: Junction,
) -> Result<Vec<Instruction>, XcmError> {
    let here = origin.vantage();
    let there = exchange.vantage();
    let reserve = reserve_of(&swap.asset_in, origin.network())?;
    let buy_execution = |vantage: Vantage| Instruction::BuyExecution {
        fees: Asset::new(localize(vantage, &swap.asset_in), swap.execution_fee),
        weight_limit: WeightLimit::Unlimited,
    };

    let mut on_exchange = vec![buy_execution(there)];
    on_exchange.extend(exchange_instructions(
        there,
        swap,
        AssetFilter::AllCounted(1),
        beneficiary,
    ));

    let all = AssetFilter::AllCounted(1);
    let transfer_out = if reserve == here {
        Instruction::DepositReserveAsset {
            assets: all,
            dest: chain_location(here, there),
            xcm: on_exchange,
        }
    } else if reserve == there {
        Instruction::InitiateReserveWithdraw {
            assets: all,
            reserve: chain_location(here, there),
            xcm: on_exchange,
        }
    } else {
        Instruction::InitiateReserveWithdraw {
            assets: all.clone(),
            reserve: chain_location(here, reserve),
            xcm: vec![
                buy_execution(reserve),
                Instruction::DepositReserveAsset {
                    assets: all,
                    dest: chain_location(reserve, there),
                    xcm: on_exchange,
                },
            ],
        }
    };

    Ok(vec![
        Instruction::WithdrawAsset(vec![Asset::new(
            localize(here, &swap.asset_in),
            swap.amount_in,
        )]),
        transfer_out,
    ])
}

/// `execute` of a program on `chain`
pub fn execute_call(
    chain: &ChainMeta,
    program: &[Instruction],
    version: Version,
    max_weight: &Weight,
) -> Result<XcmCall, XcmError> {
    let pallet = if chain.is_relay() {
        TransferPallet::XcmPallet
    } else {
        TransferPallet::PolkadotXcm
    };
    validate_pallet(chain, pallet.as_str())?;
    Ok(XcmCall::new(
        pallet.as_str(),
        "execute",
        [
            ("message", versioned_xcm(program, version)),
            ("max_weight", weight_value(max_weight)),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixture_registry;
    use crate::types::Chain;
    use rstest::rstest;

    fn dot_to_usdt(amount_in: u128) -> SwapAssets {
        SwapAssets {
            asset_in: Location::parent(),
            asset_out: Location::new(
                1,
                vec![
                    Junction::Parachain(1000),
                    Junction::PalletInstance(50),
                    Junction::GeneralIndex(1984),
                ],
            )
            .unwrap(),
            amount_in,
            min_amount_out: 990,
            execution_fee: execution_allowance(amount_in),
        }
    }

    fn beneficiary() -> Junction {
        Junction::AccountId32 {
            network: None,
            id: [7u8; 32],
        }
    }

    #[rstest]
    #[case(1_000_000, 100, 990_000)]
    #[case(1_000_000, 0, 1_000_000)]
    #[case(1_000_000, 10_000, 0)]
    #[case(u128::MAX, 0, u128::MAX)]
    fn test_min_amount_out(#[case] out: u128, #[case] bps: u16, #[case] expected: u128) {
        assert_eq!(min_amount_out(out, bps).unwrap(), expected);
    }

    #[rstest]
    #[case(1_000_000, 50_000)]
    #[case(19, 0)]
    #[case(u128::MAX, u128::MAX / 20)]
    fn test_execution_allowance(#[case] amount_in: u128, #[case] expected: u128) {
        assert_eq!(execution_allowance(amount_in), expected);
    }

    #[rstest]
    #[case("ChainA", "DOT", 2)]
    #[case("AssetHubPolkadot", "USDT", 1)]
    #[case("Polkadot", "DOT", 1)]
    fn test_remote_stops(#[case] origin: &str, #[case] symbol: &str, #[case] expected: u128) {
        let registry = fixture_registry();
        let origin = registry.chain_meta(&Chain::from(origin)).unwrap();
        let exchange = registry.chain_meta(&Chain::from("ChainX")).unwrap();
        let asset_in = match symbol {
            "DOT" => Location::parent(),
            _ => dot_to_usdt(1).asset_out,
        };
        assert_eq!(remote_stops(origin, exchange, &asset_in).unwrap(), expected);
    }

    #[test]
    fn test_net_swap_input() {
        assert_eq!(net_swap_input(1_000_000, 1).unwrap(), 950_000);
        assert_eq!(net_swap_input(1_000_000, 2).unwrap(), 900_000);
        // Too small for an allowance, nothing is held back
        assert_eq!(net_swap_input(10, 2).unwrap(), 10);
        assert!(net_swap_input(0, 1).is_err());
    }

    #[test]
    fn test_slippage_bound() {
        assert!(min_amount_out(1, 10_001).is_err());
    }

    #[test]
    fn test_reserve_of() {
        let network = NetworkId::Polkadot;
        assert_eq!(reserve_of(&Location::parent(), network).unwrap(), Vantage::relay(network));
        let usdt = dot_to_usdt(1).asset_out;
        assert_eq!(reserve_of(&usdt, network).unwrap(), Vantage::para(network, 1000));
        let bridged = Location::new(2, vec![Junction::GlobalConsensus(NetworkId::Kusama)]).unwrap();
        assert!(reserve_of(&bridged, network).is_err());
    }

    #[test]
    fn test_local_program() {
        let registry = fixture_registry();
        let exchange = registry.chain_meta(&Chain::from("ChainX")).unwrap();
        let program = local_swap_program(exchange, &dot_to_usdt(1_000), beneficiary());
        let names: Vec<_> = program.iter().map(Instruction::name).collect();
        assert_eq!(names, ["WithdrawAsset", "ExchangeAsset", "DepositAsset"]);
        match &program[1] {
            Instruction::ExchangeAsset { want, maximal, .. } => {
                assert_eq!(want[0].amount, 990);
                assert!(!maximal);
            }
            other => panic!("Expected ExchangeAsset, got {:?}", other),
        }
    }

    #[test]
    fn test_remote_program_goes_through_relay_reserve() {
        let registry = fixture_registry();
        let origin = registry.chain_meta(&Chain::from("ChainA")).unwrap();
        let exchange = registry.chain_meta(&Chain::from("ChainX")).unwrap();
        let program =
            remote_swap_program(origin, exchange, &dot_to_usdt(1_000), beneficiary()).unwrap();

        assert_eq!(program[0].name(), "WithdrawAsset");
        let Instruction::InitiateReserveWithdraw { reserve, xcm, .. } = &program[1] else {
            panic!("Expected InitiateReserveWithdraw, got {:?}", program[1]);
        };
        assert_eq!(*reserve, Location::parent());
        let Instruction::DepositReserveAsset { dest, xcm, .. } = &xcm[1] else {
            panic!("Expected DepositReserveAsset, got {:?}", xcm[1]);
        };
        assert_eq!(*dest, Location::with_junction(0, Junction::Parachain(2034)));
        let names: Vec<_> = xcm.iter().map(Instruction::name).collect();
        assert_eq!(names, ["BuyExecution", "ExchangeAsset", "DepositAsset"]);
        let Instruction::BuyExecution { fees, .. } = &xcm[0] else {
            panic!("Expected BuyExecution, got {:?}", xcm[0]);
        };
        assert_eq!(fees.amount, 50);
    }

    #[test]
    fn test_remote_program_from_reserve() {
        let registry = fixture_registry();
        let origin = registry.chain_meta(&Chain::from("AssetHubPolkadot")).unwrap();
        let exchange = registry.chain_meta(&Chain::from("ChainX")).unwrap();
        let mut swap = dot_to_usdt(1_000);
        std::mem::swap(&mut swap.asset_in, &mut swap.asset_out);
        let program = remote_swap_program(origin, exchange, &swap, beneficiary()).unwrap();
        assert_eq!(program[1].name(), "DepositReserveAsset");
    }

    #[test]
    fn test_execute_pallet() {
        let registry = fixture_registry();
        let chain = registry.chain_meta(&Chain::from("ChainX")).unwrap();
        let weight = Weight::from_ref_time(1_000);
        let call = execute_call(chain, &[], Version::V4, &weight).unwrap();
        assert_eq!(call.name(), "PolkadotXcm.execute");

        let xtokens = registry.chain_meta(&Chain::from("ChainT")).unwrap();
        assert!(execute_call(xtokens, &[], Version::V4, &weight).is_err());
    }
}
