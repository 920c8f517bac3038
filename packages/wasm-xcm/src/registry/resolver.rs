//! Currency resolution against the registry
//!
//! A [`CurrencySpecifier`] is resolved in one exhaustive match:
//! explicit locations short-circuit, ids are looked up, symbols are
//! filtered by their tag and then checked for uniqueness.

use super::{AssetInfo, ChainMeta, Registry};
use crate::error::XcmError;
use crate::location::{get_ci, to_canonical, Location};
use crate::types::Chain;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value as Json};
use tracing::{debug, warn};

/// Which part of the registry a tagged symbol is looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolTag {
    Native,
    Foreign,
    /// Foreign assets, matched by alias
    ForeignAbstract,
}

/// Caller-supplied currency
#[derive(Debug, Clone, PartialEq)]
pub enum CurrencySpecifier {
    Symbol(String),
    TaggedSymbol { symbol: String, tag: SymbolTag },
    Id(String),
    Location(Location),
    /// Used as is, without looking at the registry
    Override(Location),
}

impl CurrencySpecifier {
    pub fn symbol(symbol: &str) -> Self {
        CurrencySpecifier::Symbol(symbol.to_string())
    }

    pub fn to_json(&self) -> Json {
        match self {
            CurrencySpecifier::Symbol(s) => json!({ "symbol": s }),
            CurrencySpecifier::TaggedSymbol { symbol, tag } => {
                json!({ "symbol": { "type": tag, "value": symbol } })
            }
            CurrencySpecifier::Id(id) => json!({ "id": id }),
            CurrencySpecifier::Location(l) => json!({ "location": l.to_json() }),
            CurrencySpecifier::Override(l) => json!({ "location": l.to_json(), "override": true }),
        }
    }

    pub fn from_json(raw: &Json) -> Result<Self, XcmError> {
        let invalid = |msg: &str| XcmError::InvalidCurrency(msg.to_string());
        let obj = raw
            .as_object()
            .ok_or_else(|| invalid("currency must be an object"))?;

        if let Some(location) = get_ci(obj, "location") {
            let location = Location::from_json(location)?;
            let overridden = get_ci(obj, "override")
                .and_then(Json::as_bool)
                .unwrap_or(false);
            return Ok(if overridden {
                CurrencySpecifier::Override(location)
            } else {
                CurrencySpecifier::Location(location)
            });
        }

        if let Some(id) = get_ci(obj, "id") {
            let id = match id {
                Json::String(s) => s.clone(),
                Json::Number(n) => n.to_string(),
                _ => return Err(invalid("id must be a string or number")),
            };
            return Ok(CurrencySpecifier::Id(id));
        }

        match get_ci(obj, "symbol") {
            Some(Json::String(s)) => Ok(CurrencySpecifier::Symbol(s.clone())),
            Some(Json::Object(tagged)) => {
                let tag = get_ci(tagged, "type")
                    .cloned()
                    .ok_or_else(|| invalid("tagged symbol is missing type"))?;
                let tag: SymbolTag = serde_json::from_value(tag)
                    .map_err(|e| invalid(&format!("unknown symbol tag: {}", e)))?;
                let symbol = get_ci(tagged, "value")
                    .and_then(Json::as_str)
                    .ok_or_else(|| invalid("tagged symbol is missing value"))?;
                Ok(CurrencySpecifier::TaggedSymbol {
                    symbol: symbol.to_string(),
                    tag,
                })
            }
            _ => Err(invalid(
                "currency needs one of symbol, id or location",
            )),
        }
    }
}

impl Serialize for CurrencySpecifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CurrencySpecifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        CurrencySpecifier::from_json(&raw).map_err(de::Error::custom)
    }
}

/// Outcome of currency resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResolvedCurrency {
    Registered { asset: AssetInfo, location: Location },
    /// Explicit location that matches no registered asset
    Unregistered { location: Location },
    Overridden { location: Location },
}

impl ResolvedCurrency {
    /// Canonical location to embed in a call
    pub fn location(&self) -> &Location {
        match self {
            ResolvedCurrency::Registered { location, .. }
            | ResolvedCurrency::Unregistered { location }
            | ResolvedCurrency::Overridden { location } => location,
        }
    }

    pub fn asset(&self) -> Option<&AssetInfo> {
        match self {
            ResolvedCurrency::Registered { asset, .. } => Some(asset),
            _ => None,
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        self.asset().map(|a| a.symbol.as_str())
    }
}

impl Registry {
    /// Resolve a currency on a chain
    pub fn resolve(
        &self,
        chain: &Chain,
        specifier: &CurrencySpecifier,
    ) -> Result<ResolvedCurrency, XcmError> {
        let meta = self.chain_meta(chain)?;

        let resolved = match specifier {
            CurrencySpecifier::Override(location) => ResolvedCurrency::Overridden {
                location: location.clone(),
            },
            CurrencySpecifier::Location(location) => {
                let location = to_canonical(meta.vantage(), location)?;
                match self.find_by_location(meta, &location)? {
                    Some(asset) => registered(meta, asset)?,
                    None => ResolvedCurrency::Unregistered { location },
                }
            }
            CurrencySpecifier::Id(id) => {
                let asset = self
                    .other_assets(chain)?
                    .iter()
                    .find(|a| a.asset_id.as_deref() == Some(id.as_str()))
                    .ok_or_else(|| {
                        XcmError::InvalidCurrency(format!(
                            "No asset with id {} on {}",
                            id, chain
                        ))
                    })?;
                registered(meta, asset)?
            }
            CurrencySpecifier::TaggedSymbol { symbol, tag } => {
                let asset = self.find_tagged(chain, symbol, *tag)?;
                registered(meta, asset)?
            }
            CurrencySpecifier::Symbol(symbol) => {
                let asset = self.find_by_symbol(chain, symbol)?;
                registered(meta, asset)?
            }
        };

        debug!(%chain, location = %resolved.location(), "Resolved currency");
        Ok(resolved)
    }

    /// Bare symbol lookup across native and foreign assets
    ///
    /// Falls back to the `xc`-toggled variant when nothing matches exactly.
    /// More than one match is always an error.
    pub fn find_by_symbol(&self, chain: &Chain, symbol: &str) -> Result<&AssetInfo, XcmError> {
        let assets = self.list_assets(chain)?;
        let mut matches = symbol_matches(&assets, symbol);
        if matches.is_empty() {
            if let Some(variant) = xc_variant(symbol) {
                matches = symbol_matches(&assets, &variant);
            }
        }
        unique(chain, symbol, matches)
    }

    fn find_tagged(
        &self,
        chain: &Chain,
        symbol: &str,
        tag: SymbolTag,
    ) -> Result<&AssetInfo, XcmError> {
        let matches = match tag {
            SymbolTag::Native => {
                let natives: Vec<&AssetInfo> = self.native_assets(chain)?.iter().collect();
                symbol_matches(&natives, symbol)
            }
            SymbolTag::Foreign => {
                let foreign: Vec<&AssetInfo> = self.other_assets(chain)?.iter().collect();
                let exact = symbol_matches(&foreign, symbol);
                match xc_variant(symbol) {
                    Some(variant) if exact.is_empty() => symbol_matches(&foreign, &variant),
                    _ => exact,
                }
            }
            SymbolTag::ForeignAbstract => self
                .other_assets(chain)?
                .iter()
                .filter(|a| {
                    a.alias
                        .as_deref()
                        .is_some_and(|alias| alias.eq_ignore_ascii_case(symbol))
                })
                .collect(),
        };
        unique(chain, symbol, matches)
    }

    fn find_by_location(
        &self,
        meta: &ChainMeta,
        location: &Location,
    ) -> Result<Option<&AssetInfo>, XcmError> {
        for asset in self.list_assets(&meta.name)? {
            if asset.canonical_location(meta)? == *location {
                return Ok(Some(asset));
            }
        }
        Ok(None)
    }

    /// Whether a chain registers an asset under this symbol
    ///
    /// Also accepts the `xc`-toggled and `.e`-toggled spellings.
    pub fn supports_symbol(&self, chain: &Chain, symbol: &str) -> bool {
        let Ok(assets) = self.list_assets(chain) else {
            return false;
        };
        let mut candidates = vec![symbol.to_string()];
        candidates.extend(xc_variant(symbol));
        candidates.extend(bridged_variant(symbol));
        candidates
            .iter()
            .any(|c| !symbol_matches(&assets, c).is_empty())
    }

    /// Decimals for display and amount scaling
    ///
    /// Uses the asset's own decimals, then those of same-symbol entries on the
    /// chain. Returns `None` when neither is known.
    pub fn asset_decimals(
        &self,
        chain: &Chain,
        specifier: &CurrencySpecifier,
    ) -> Result<Option<u8>, XcmError> {
        let resolved = self.resolve(chain, specifier)?;
        let Some(asset) = resolved.asset() else {
            return Ok(None);
        };

        let assets = self.list_assets(chain)?;
        let table: Vec<u8> = symbol_matches(&assets, &asset.symbol)
            .into_iter()
            .filter_map(|a| a.decimals)
            .collect();

        match asset.decimals {
            Some(declared) => {
                if table.iter().any(|d| *d != declared) {
                    warn!(
                        %chain,
                        symbol = %asset.symbol,
                        declared,
                        ?table,
                        "Registry decimals disagree for symbol"
                    );
                }
                Ok(Some(declared))
            }
            None => Ok(table.first().copied()),
        }
    }

    /// Existential deposit of a resolved currency on another chain
    ///
    /// Matches the destination asset by location first, then by symbol.
    /// Overridden currencies have no registry entry and yield `None`.
    pub fn existential_deposit(
        &self,
        chain: &Chain,
        currency: &ResolvedCurrency,
    ) -> Result<Option<u128>, XcmError> {
        if matches!(currency, ResolvedCurrency::Overridden { .. }) {
            return Ok(None);
        }
        let meta = self.chain_meta(chain)?;
        if let Some(asset) = self.find_by_location(meta, currency.location())? {
            return Ok(asset.existential_deposit);
        }
        match currency.symbol() {
            Some(symbol) => Ok(self.find_by_symbol(chain, symbol)?.existential_deposit),
            None => Ok(None),
        }
    }
}

fn registered(meta: &ChainMeta, asset: &AssetInfo) -> Result<ResolvedCurrency, XcmError> {
    Ok(ResolvedCurrency::Registered {
        location: asset.canonical_location(meta)?,
        asset: asset.clone(),
    })
}

fn symbol_matches<'a>(assets: &[&'a AssetInfo], symbol: &str) -> Vec<&'a AssetInfo> {
    assets
        .iter()
        .copied()
        .filter(|a| a.symbol.eq_ignore_ascii_case(symbol))
        .collect()
}

fn unique<'a>(
    chain: &Chain,
    symbol: &str,
    matches: Vec<&'a AssetInfo>,
) -> Result<&'a AssetInfo, XcmError> {
    match matches.as_slice() {
        [single] => Ok(single),
        [] => Err(XcmError::InvalidCurrency(format!(
            "Symbol {} is not registered on {}",
            symbol, chain
        ))),
        many => Err(XcmError::DuplicateAsset {
            symbol: symbol.to_string(),
            chain: chain.to_string(),
            matches: many.len(),
        }),
    }
}

/// "xcDOT" <-> "DOT"
fn xc_variant(symbol: &str) -> Option<String> {
    if let Some(base) = symbol
        .get(..2)
        .filter(|p| p.eq_ignore_ascii_case("xc"))
        .and_then(|_| symbol.get(2..))
        .filter(|b| !b.is_empty())
    {
        Some(base.to_string())
    } else if symbol.is_empty() {
        None
    } else {
        Some(format!("xc{}", symbol))
    }
}

/// "WETH.e" <-> "WETH"
fn bridged_variant(symbol: &str) -> Option<String> {
    match symbol.strip_suffix(".e") {
        Some(base) if !base.is_empty() => Some(base.to_string()),
        Some(_) => None,
        None => Some(format!("{}.e", symbol)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::location::Junction;
    use crate::test_utils::fixture_registry;
    use rstest::rstest;

    fn builtin() -> &'static Registry {
        Registry::builtin().unwrap()
    }

    #[test]
    fn test_resolve_native_symbol_on_acala() {
        let resolved = builtin()
            .resolve(&Chain::from("Acala"), &CurrencySpecifier::symbol("ACA"))
            .unwrap();
        assert_eq!(resolved.symbol(), Some("ACA"));
        assert_eq!(
            *resolved.location(),
            Location::with_junction(1, Junction::Parachain(2000))
        );
    }

    #[test]
    fn test_resolve_unknown_symbol_on_acala() {
        let err = builtin()
            .resolve(&Chain::from("Acala"), &CurrencySpecifier::symbol("UNIT"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCurrency);
    }

    #[test]
    fn test_duplicate_symbols_never_resolve() {
        let registry = builtin();
        for chain in registry.chains() {
            let assets = registry.list_assets(&chain.name).unwrap();
            for asset in &assets {
                let count = assets
                    .iter()
                    .filter(|a| a.symbol.eq_ignore_ascii_case(&asset.symbol))
                    .count();
                if count > 1 {
                    let err = registry
                        .resolve(&chain.name, &CurrencySpecifier::symbol(&asset.symbol))
                        .unwrap_err();
                    assert_eq!(err.kind(), ErrorKind::DuplicateAsset);
                }
            }
        }
    }

    #[test]
    fn test_duplicate_names_symbol() {
        let err = fixture_registry()
            .resolve(&Chain::from("ChainX"), &CurrencySpecifier::symbol("USDC"))
            .unwrap_err();
        match err {
            XcmError::DuplicateAsset { symbol, matches, .. } => {
                assert_eq!(symbol, "USDC");
                assert_eq!(matches, 2);
            }
            other => panic!("Expected DuplicateAsset, got {:?}", other),
        }
    }

    #[test]
    fn test_tag_disambiguates_duplicate() {
        let registry = fixture_registry();
        let chain = Chain::from("ChainX");
        let resolved = registry
            .resolve(
                &chain,
                &CurrencySpecifier::TaggedSymbol {
                    symbol: "USDC.wh".into(),
                    tag: SymbolTag::ForeignAbstract,
                },
            )
            .unwrap();
        assert_eq!(resolved.asset().unwrap().asset_id.as_deref(), Some("21"));
    }

    #[test]
    fn test_resolve_by_id() {
        let registry = fixture_registry();
        let chain = Chain::from("ChainX");
        let resolved = registry
            .resolve(&chain, &CurrencySpecifier::Id("22".into()))
            .unwrap();
        assert_eq!(resolved.symbol(), Some("USDC"));

        let err = registry
            .resolve(&chain, &CurrencySpecifier::Id("999".into()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCurrency);
    }

    #[test]
    fn test_resolve_by_location_finds_registered_asset() {
        let registry = fixture_registry();
        let resolved = registry
            .resolve(
                &Chain::from("ChainB"),
                &CurrencySpecifier::Location(Location::parent()),
            )
            .unwrap();
        assert_eq!(resolved.symbol(), Some("DOT"));
    }

    #[test]
    fn test_unregistered_location_and_override() {
        let registry = fixture_registry();
        let chain = Chain::from("ChainB");
        let odd = Location::new(1, vec![Junction::Parachain(4444), Junction::GeneralIndex(1)])
            .unwrap();

        let resolved = registry
            .resolve(&chain, &CurrencySpecifier::Location(odd.clone()))
            .unwrap();
        assert!(matches!(resolved, ResolvedCurrency::Unregistered { .. }));

        // Overrides are passed through untouched, even chain-local ones
        let local = Location::with_junction(0, Junction::GeneralIndex(9));
        let resolved = registry
            .resolve(&chain, &CurrencySpecifier::Override(local.clone()))
            .unwrap();
        assert_eq!(resolved, ResolvedCurrency::Overridden { location: local });
    }

    #[rstest]
    #[case("Moonbeam", "DOT", "xcDOT")]
    #[case("Moonbeam", "xcDOT", "xcDOT")]
    #[case("Acala", "DOT", "DOT")]
    fn test_xc_fallback(#[case] chain: &str, #[case] query: &str, #[case] expected: &str) {
        let asset = builtin()
            .find_by_symbol(&Chain::from(chain), query)
            .unwrap();
        assert_eq!(asset.symbol, expected);
    }

    #[test]
    fn test_supports_symbol_variants() {
        let registry = builtin();
        assert!(registry.supports_symbol(&Chain::from("Moonbeam"), "DOT"));
        assert!(registry.supports_symbol(&Chain::from("Hydration"), "WETH"));
        assert!(!registry.supports_symbol(&Chain::from("Acala"), "UNIT"));
        assert!(!registry.supports_symbol(&Chain::from("Atlantis"), "DOT"));
    }

    #[test]
    fn test_decimals_fallback() {
        let registry = fixture_registry();
        let chain = Chain::from("ChainB");

        // Declared
        assert_eq!(
            registry
                .asset_decimals(&chain, &CurrencySpecifier::symbol("DOT"))
                .unwrap(),
            Some(10)
        );
        // Missing on the asset, taken from another entry with the same symbol
        assert_eq!(
            registry
                .asset_decimals(&chain, &CurrencySpecifier::Id("77".into()))
                .unwrap(),
            Some(6)
        );
        // Unknown
        assert_eq!(
            registry
                .asset_decimals(&chain, &CurrencySpecifier::symbol("NODEC"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_specifier_json_forms() {
        let cases = [
            (json!({ "symbol": "DOT" }), CurrencySpecifier::symbol("DOT")),
            (
                json!({ "symbol": { "type": "Native", "value": "DOT" } }),
                CurrencySpecifier::TaggedSymbol {
                    symbol: "DOT".into(),
                    tag: SymbolTag::Native,
                },
            ),
            (json!({ "id": 1984 }), CurrencySpecifier::Id("1984".into())),
            (
                json!({ "location": { "parents": 1, "interior": "Here" } }),
                CurrencySpecifier::Location(Location::parent()),
            ),
            (
                json!({ "location": { "parents": 1, "interior": "Here" }, "override": true }),
                CurrencySpecifier::Override(Location::parent()),
            ),
        ];
        for (raw, expected) in cases {
            let parsed: CurrencySpecifier = serde_json::from_value(raw).unwrap();
            assert_eq!(parsed, expected);
            let again: CurrencySpecifier = serde_json::from_value(parsed.to_json()).unwrap();
            assert_eq!(again, expected);
        }
    }

    #[test]
    fn test_specifier_rejects_empty_object() {
        let err = CurrencySpecifier::from_json(&json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCurrency);
    }

    #[test]
    fn test_existential_deposit_matches_location_before_symbol() {
        let registry = fixture_registry();
        let busd = registry
            .resolve(&Chain::from("ChainX"), &CurrencySpecifier::symbol("BUSD"))
            .unwrap();
        // ChainB lists BUSD twice; the location picks the right entry
        let ed = registry
            .existential_deposit(&Chain::from("ChainB"), &busd)
            .unwrap();
        assert_eq!(ed, Some(5));
    }

    #[rstest]
    #[case("ChainA", CurrencySpecifier::symbol("USDT"), Some(10))]
    #[case("ChainA", CurrencySpecifier::symbol("DOT"), Some(100))]
    // No ChainB asset at this USDC's location, so the symbol decides
    #[case("ChainX", CurrencySpecifier::Id("21".into()), Some(3))]
    fn test_existential_deposit_on_chain_b(
        #[case] origin: &str,
        #[case] specifier: CurrencySpecifier,
        #[case] expected: Option<u128>,
    ) {
        let registry = fixture_registry();
        let currency = registry.resolve(&Chain::from(origin), &specifier).unwrap();
        let ed = registry
            .existential_deposit(&Chain::from("ChainB"), &currency)
            .unwrap();
        assert_eq!(ed, expected);
    }

    #[test]
    fn test_existential_deposit_duplicate_symbol_is_an_error() {
        let registry = fixture_registry();
        // ChainA's BUSD lives elsewhere, so only the ambiguous symbol is left
        let busd = registry
            .resolve(&Chain::from("ChainA"), &CurrencySpecifier::symbol("BUSD"))
            .unwrap();
        let err = registry
            .existential_deposit(&Chain::from("ChainB"), &busd)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateAsset);
    }

    #[test]
    fn test_existential_deposit_of_override_is_unknown() {
        let registry = fixture_registry();
        let currency = ResolvedCurrency::Overridden {
            location: Location::parent(),
        };
        let ed = registry
            .existential_deposit(&Chain::from("ChainB"), &currency)
            .unwrap();
        assert_eq!(ed, None);
    }
}
