//! Location transforms between vantage points
//!
//! Registry locations are kept in *canonical* form: relative to a parachain
//! of the same consensus (`parents: 1` reaches the relay chain). Calls need
//! them relative to the chain that interprets the message, which is what
//! [`localize`] produces. [`normalize`] turns a chain-local location into
//! the form a receiving chain expects.

use super::{Interior, Junction, Location, NetworkId};
use crate::error::XcmError;

/// Where a location is interpreted from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vantage {
    /// `None` for a relay chain
    pub para_id: Option<u32>,
    pub network: NetworkId,
}

impl Vantage {
    pub fn relay(network: NetworkId) -> Self {
        Vantage {
            para_id: None,
            network,
        }
    }

    pub fn para(network: NetworkId, para_id: u32) -> Self {
        Vantage {
            para_id: Some(para_id),
            network,
        }
    }
}

/// Prefix a chain-local location with the chain that produced it
///
/// Returned unchanged when the interior is `Here`, when `parents` is already
/// non-zero, or when the junctions already name a parachain. Applying it twice
/// is the same as applying it once.
pub fn normalize(location: &Location, context_para_id: u32) -> Result<Location, XcmError> {
    if location.interior.is_here()
        || location.parents != 0
        || location.para_id().is_some()
    {
        return Ok(location.clone());
    }
    Ok(Location {
        parents: 1,
        interior: location
            .interior
            .pushed_front(Junction::Parachain(context_para_id))?,
    })
}

/// View a canonical location from `vantage`
///
/// A relay chain drops one parent. A parachain strips its own leading
/// `Parachain` junction. Anything else is already correct from the vantage.
pub fn localize(vantage: Vantage, location: &Location) -> Location {
    match vantage.para_id {
        None if location.parents > 0 => Location {
            parents: location.parents - 1,
            interior: location.interior.clone(),
        },
        None => location.clone(),
        Some(para) => match location.interior.first() {
            Some(Junction::Parachain(id)) if *id == para && location.parents == 1 => Location {
                parents: 0,
                interior: location.interior.without_first(),
            },
            _ => location.clone(),
        },
    }
}

/// Inverse of [`localize`]: lift a location seen from `vantage` into canonical form
pub fn to_canonical(vantage: Vantage, location: &Location) -> Result<Location, XcmError> {
    match vantage.para_id {
        None if location.parents == 0 => Ok(Location {
            parents: 1,
            interior: location.interior.clone(),
        }),
        None => Ok(location.clone()),
        Some(para) if location.parents == 0 && location.interior.is_here() => {
            Ok(Location::with_junction(1, Junction::Parachain(para)))
        }
        Some(para) => normalize(location, para),
    }
}

/// Location of chain `to` as seen from chain `from`
///
/// Chains of another consensus are reached through `GlobalConsensus`.
pub fn chain_location(from: Vantage, to: Vantage) -> Location {
    if from.network != to.network {
        let mut junctions = vec![Junction::GlobalConsensus(to.network)];
        junctions.extend(to.para_id.map(Junction::Parachain));
        return Location {
            parents: if from.para_id.is_some() { 2 } else { 1 },
            interior: Interior(junctions),
        };
    }

    match (from.para_id, to.para_id) {
        (None, Some(para)) => Location::with_junction(0, Junction::Parachain(para)),
        (Some(_), None) => Location::parent(),
        (Some(_), Some(para)) => Location::with_junction(1, Junction::Parachain(para)),
        (None, None) => Location::here(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn loc(parents: u8, junctions: Vec<Junction>) -> Location {
        Location::new(parents, junctions).unwrap()
    }

    #[rstest]
    #[case(loc(0, vec![Junction::GeneralIndex(5)]))]
    #[case(loc(0, vec![Junction::PalletInstance(50), Junction::GeneralIndex(1984)]))]
    #[case(loc(0, vec![]))]
    #[case(loc(1, vec![]))]
    #[case(loc(1, vec![Junction::Parachain(1000), Junction::GeneralIndex(1)]))]
    #[case(loc(0, vec![Junction::Parachain(2034), Junction::GeneralIndex(1)]))]
    fn test_normalize_is_idempotent(#[case] location: Location) {
        let once = normalize(&location, 2000).unwrap();
        let twice = normalize(&once, 2000).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_prepends_context_chain() {
        let local = loc(0, vec![Junction::GeneralIndex(5)]);
        let normalized = normalize(&local, 2000).unwrap();
        assert_eq!(
            normalized,
            loc(1, vec![Junction::Parachain(2000), Junction::GeneralIndex(5)])
        );
    }

    #[rstest]
    #[case(loc(0, vec![]))]
    #[case(loc(1, vec![Junction::GeneralIndex(5)]))]
    #[case(loc(0, vec![Junction::Parachain(2034)]))]
    fn test_normalize_leaves_qualified_locations(#[case] location: Location) {
        assert_eq!(normalize(&location, 2000).unwrap(), location);
    }

    #[test]
    fn test_normalize_full_interior_errors() {
        let full = loc(0, vec![Junction::GeneralIndex(1); 8]);
        assert!(normalize(&full, 2000).is_err());
    }

    #[test]
    fn test_localize_on_relay_drops_parent() {
        let relay = Vantage::relay(NetworkId::Polkadot);
        assert_eq!(localize(relay, &Location::parent()), Location::here());
        assert_eq!(
            localize(relay, &loc(1, vec![Junction::Parachain(1000)])),
            loc(0, vec![Junction::Parachain(1000)])
        );
    }

    #[test]
    fn test_localize_strips_own_parachain() {
        let asset_hub = Vantage::para(NetworkId::Polkadot, 1000);
        let usdt = loc(
            1,
            vec![
                Junction::Parachain(1000),
                Junction::PalletInstance(50),
                Junction::GeneralIndex(1984),
            ],
        );
        assert_eq!(
            localize(asset_hub, &usdt),
            loc(0, vec![Junction::PalletInstance(50), Junction::GeneralIndex(1984)])
        );

        // Other chains see it unchanged
        let acala = Vantage::para(NetworkId::Polkadot, 2000);
        assert_eq!(localize(acala, &usdt), usdt);
    }

    #[rstest]
    #[case(Vantage::relay(NetworkId::Polkadot))]
    #[case(Vantage::para(NetworkId::Polkadot, 1000))]
    #[case(Vantage::para(NetworkId::Polkadot, 2000))]
    fn test_canonical_roundtrip(#[case] vantage: Vantage) {
        let canonical = loc(
            1,
            vec![
                Junction::Parachain(1000),
                Junction::PalletInstance(50),
                Junction::GeneralIndex(1984),
            ],
        );
        let local = localize(vantage, &canonical);
        assert_eq!(to_canonical(vantage, &local).unwrap(), canonical);
    }

    #[test]
    fn test_own_native_is_canonicalized_to_chain() {
        let acala = Vantage::para(NetworkId::Polkadot, 2000);
        assert_eq!(
            to_canonical(acala, &Location::here()).unwrap(),
            loc(1, vec![Junction::Parachain(2000)])
        );
    }

    #[test]
    fn test_chain_location() {
        let relay = Vantage::relay(NetworkId::Polkadot);
        let asset_hub = Vantage::para(NetworkId::Polkadot, 1000);
        let acala = Vantage::para(NetworkId::Polkadot, 2000);
        let ksm_hub = Vantage::para(NetworkId::Kusama, 1000);

        assert_eq!(
            chain_location(relay, acala),
            loc(0, vec![Junction::Parachain(2000)])
        );
        assert_eq!(chain_location(acala, relay), Location::parent());
        assert_eq!(
            chain_location(acala, asset_hub),
            loc(1, vec![Junction::Parachain(1000)])
        );
        assert_eq!(
            chain_location(asset_hub, ksm_hub),
            loc(
                2,
                vec![
                    Junction::GlobalConsensus(NetworkId::Kusama),
                    Junction::Parachain(1000)
                ]
            )
        );
    }
}
