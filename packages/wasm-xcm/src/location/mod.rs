//! Location model
//!
//! A [`Location`] is a parent-hop count plus an ordered interior of at most
//! eight [`Junction`]s. Internally the interior is always a flat list; the
//! legacy keyed-arity encodings (`X1`..`X8`, bare object vs. array `X1`) are
//! only handled at the JSON boundary.
//!
//! JSON input is accepted with case-insensitive keys and either wrapping
//! generation, so `{"X1": {"Parachain": 1000}}` and `{"x1": [{"parachain": 1000}]}`
//! parse to the same value. Output always uses the array form.

pub mod transform;

use crate::error::XcmError;
use crate::types::parse_u128;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value as Json};
use std::cmp::Ordering;
use std::fmt;

pub use transform::{chain_location, localize, normalize, to_canonical, Vantage};

/// Maximum junctions in an interior
pub const MAX_JUNCTIONS: usize = 8;

/// Largest integer JS can represent exactly
const MAX_SAFE_INTEGER: u128 = 9_007_199_254_740_991;

/// Global consensus network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NetworkId {
    ByGenesis([u8; 32]),
    Polkadot,
    Kusama,
    Westend,
    Rococo,
    Ethereum { chain_id: u64 },
}

/// One hop of a location interior
///
/// Variant order follows the on-chain definition so derived ordering matches
/// the runtime's asset sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Junction {
    Parachain(u32),
    AccountId32 {
        network: Option<NetworkId>,
        id: [u8; 32],
    },
    AccountIndex64 {
        network: Option<NetworkId>,
        index: u64,
    },
    AccountKey20 {
        network: Option<NetworkId>,
        key: [u8; 20],
    },
    PalletInstance(u8),
    GeneralIndex(u128),
    GeneralKey {
        length: u8,
        data: [u8; 32],
    },
    OnlyChild,
    GlobalConsensus(NetworkId),
}

/// Ordered junction list; empty means "Here"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Interior(Vec<Junction>);

impl Interior {
    pub fn here() -> Self {
        Interior(Vec::new())
    }

    pub fn new(junctions: Vec<Junction>) -> Result<Self, XcmError> {
        if junctions.len() > MAX_JUNCTIONS {
            return Err(XcmError::InvalidParameter(format!(
                "Location interior has {} junctions, maximum is {}",
                junctions.len(),
                MAX_JUNCTIONS
            )));
        }
        Ok(Interior(junctions))
    }

    pub fn is_here(&self) -> bool {
        self.0.is_empty()
    }

    pub fn junctions(&self) -> &[Junction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Junction> {
        self.0.first()
    }

    pub(crate) fn pushed_front(&self, junction: Junction) -> Result<Self, XcmError> {
        let mut junctions = Vec::with_capacity(self.0.len() + 1);
        junctions.push(junction);
        junctions.extend_from_slice(&self.0);
        Interior::new(junctions)
    }

    pub(crate) fn without_first(&self) -> Self {
        Interior(self.0.iter().skip(1).copied().collect())
    }
}

// Shorter interiors sort first, matching the X1 < X2 < ... variant order on chain
impl Ord for Interior {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Interior {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Hierarchical address relative to a vantage point
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub parents: u8,
    pub interior: Interior,
}

impl Location {
    pub fn new(parents: u8, junctions: Vec<Junction>) -> Result<Self, XcmError> {
        Ok(Location {
            parents,
            interior: Interior::new(junctions)?,
        })
    }

    /// `{ parents: 0, interior: Here }`
    pub fn here() -> Self {
        Location {
            parents: 0,
            interior: Interior::here(),
        }
    }

    /// `{ parents: 1, interior: Here }`: the relay chain seen from a parachain
    pub fn parent() -> Self {
        Location {
            parents: 1,
            interior: Interior::here(),
        }
    }

    pub fn with_junction(parents: u8, junction: Junction) -> Self {
        Location {
            parents,
            interior: Interior(vec![junction]),
        }
    }

    pub fn junctions(&self) -> &[Junction] {
        self.interior.junctions()
    }

    /// First parachain id named in the interior, if any
    pub fn para_id(&self) -> Option<u32> {
        self.junctions().iter().find_map(|j| match j {
            Junction::Parachain(id) => Some(*id),
            _ => None,
        })
    }

    /// Same location with `junction` appended to the interior
    pub fn appended(&self, junction: Junction) -> Result<Self, XcmError> {
        let mut junctions = self.junctions().to_vec();
        junctions.push(junction);
        Location::new(self.parents, junctions)
    }

    pub fn to_json(&self) -> Json {
        json!({
            "parents": self.parents,
            "interior": interior_to_json(&self.interior),
        })
    }

    pub fn from_json(raw: &Json) -> Result<Self, XcmError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| invalid("location must be an object"))?;
        let parents = get_ci(obj, "parents")
            .ok_or_else(|| invalid("location is missing parents"))?;
        let parents = u8::try_from(json_u128(parents)?)
            .map_err(|_| invalid("parents does not fit in u8"))?;
        let interior = get_ci(obj, "interior")
            .ok_or_else(|| invalid("location is missing interior"))?;
        Ok(Location {
            parents,
            interior: Interior::new(flatten(interior)?)?,
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Location::from_json(&raw).map_err(de::Error::custom)
    }
}

impl Serialize for Junction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Junction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Junction::from_json(&raw).map_err(de::Error::custom)
    }
}

/// Normalize either interior encoding into one ordered junction list
///
/// Accepts `"Here"`, a keyed-arity wrapper (`{"X2": [..]}`, `{"X1": {..}}`),
/// a bare junction object or a plain array of junctions. A bare junction
/// and a one-element array yield the same list.
pub fn flatten(raw: &Json) -> Result<Vec<Junction>, XcmError> {
    match raw {
        Json::Null => Ok(Vec::new()),
        Json::String(s) if s.eq_ignore_ascii_case("here") => Ok(Vec::new()),
        Json::Array(items) => items.iter().map(Junction::from_json).collect(),
        Json::Object(obj) => {
            let (key, value) = single_entry(obj)?;
            if key.eq_ignore_ascii_case("here") {
                return Ok(Vec::new());
            }
            match arity(&key) {
                Some(n) => {
                    let junctions = flatten_arity_body(value)?;
                    if junctions.len() != n {
                        return Err(invalid(&format!(
                            "{} expects {} junctions, got {}",
                            key,
                            n,
                            junctions.len()
                        )));
                    }
                    Ok(junctions)
                }
                None => Ok(vec![Junction::from_json(raw)?]),
            }
        }
        other => Err(invalid(&format!("unrecognized interior: {}", other))),
    }
}

fn flatten_arity_body(value: &Json) -> Result<Vec<Junction>, XcmError> {
    match value {
        Json::Array(items) => items.iter().map(Junction::from_json).collect(),
        single => Ok(vec![Junction::from_json(single)?]),
    }
}

/// Effective location of an asset, whichever generation wrapped it
///
/// Handles `{"V3": ..}`/`{"V4": ..}` version headers, the older
/// `{"id": {"Concrete": location}}` id form and the newer bare `{"id": location}`.
/// A bare location is returned as is.
pub fn extract_asset_reference(raw: &Json) -> Result<Location, XcmError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| invalid("asset must be an object"))?;

    if obj.len() == 1 {
        let (key, inner) = single_entry(obj)?;
        if is_version_key(&key) {
            return extract_asset_reference(inner);
        }
    }

    let Some(id) = get_ci(obj, "id") else {
        // Already a location
        return Location::from_json(raw);
    };

    if let Some(id_obj) = id.as_object() {
        if id_obj.len() == 1 {
            let (key, inner) = single_entry(id_obj)?;
            if key.eq_ignore_ascii_case("concrete") {
                return Location::from_json(inner);
            }
            if key.eq_ignore_ascii_case("abstract") {
                return Err(invalid("abstract asset ids have no location"));
            }
        }
    }
    Location::from_json(id)
}

impl Junction {
    pub fn to_json(&self) -> Json {
        match self {
            Junction::Parachain(id) => json!({ "Parachain": id }),
            Junction::AccountId32 { network, id } => json!({
                "AccountId32": { "network": network_opt_to_json(network), "id": hex_str(id) }
            }),
            Junction::AccountIndex64 { network, index } => json!({
                "AccountIndex64": { "network": network_opt_to_json(network), "index": index }
            }),
            Junction::AccountKey20 { network, key } => json!({
                "AccountKey20": { "network": network_opt_to_json(network), "key": hex_str(key) }
            }),
            Junction::PalletInstance(i) => json!({ "PalletInstance": i }),
            Junction::GeneralIndex(i) => json!({ "GeneralIndex": big_to_json(*i) }),
            Junction::GeneralKey { length, data } => json!({
                "GeneralKey": { "length": length, "data": hex_str(data) }
            }),
            Junction::OnlyChild => json!({ "OnlyChild": null }),
            Junction::GlobalConsensus(n) => json!({ "GlobalConsensus": network_to_json(n) }),
        }
    }

    pub fn from_json(raw: &Json) -> Result<Self, XcmError> {
        if let Json::String(s) = raw {
            if s.eq_ignore_ascii_case("onlychild") {
                return Ok(Junction::OnlyChild);
            }
            return Err(invalid(&format!("unknown junction: {}", s)));
        }
        let obj = raw
            .as_object()
            .ok_or_else(|| invalid("junction must be an object"))?;
        let (key, value) = single_entry(obj)?;

        match key.to_ascii_lowercase().as_str() {
            "parachain" => Ok(Junction::Parachain(
                u32::try_from(json_u128(value)?).map_err(|_| invalid("parachain id overflows u32"))?,
            )),
            "accountid32" => {
                let fields = object(value, "AccountId32")?;
                Ok(Junction::AccountId32 {
                    network: network_field(fields)?,
                    id: bytes_field::<32>(fields, "id")?,
                })
            }
            "accountindex64" => {
                let fields = object(value, "AccountIndex64")?;
                let index = get_ci(fields, "index").ok_or_else(|| invalid("missing index"))?;
                Ok(Junction::AccountIndex64 {
                    network: network_field(fields)?,
                    index: u64::try_from(json_u128(index)?)
                        .map_err(|_| invalid("account index overflows u64"))?,
                })
            }
            "accountkey20" => {
                let fields = object(value, "AccountKey20")?;
                Ok(Junction::AccountKey20 {
                    network: network_field(fields)?,
                    key: bytes_field::<20>(fields, "key")?,
                })
            }
            "palletinstance" => Ok(Junction::PalletInstance(
                u8::try_from(json_u128(value)?).map_err(|_| invalid("pallet instance overflows u8"))?,
            )),
            "generalindex" => Ok(Junction::GeneralIndex(json_u128(value)?)),
            "generalkey" => {
                let fields = object(value, "GeneralKey")?;
                let data = get_ci(fields, "data").ok_or_else(|| invalid("missing data"))?;
                let data = padded_bytes(data)?;
                let length = match get_ci(fields, "length") {
                    Some(l) => u8::try_from(json_u128(l)?)
                        .ok()
                        .filter(|l| *l <= 32)
                        .ok_or_else(|| invalid("general key length must be at most 32"))?,
                    None => data.1,
                };
                Ok(Junction::GeneralKey {
                    length,
                    data: data.0,
                })
            }
            "onlychild" => Ok(Junction::OnlyChild),
            "globalconsensus" => Ok(Junction::GlobalConsensus(network_from_json(value)?)),
            other => Err(invalid(&format!("unknown junction: {}", other))),
        }
    }
}

impl NetworkId {
    pub fn variant_name(&self) -> &'static str {
        match self {
            NetworkId::ByGenesis(_) => "ByGenesis",
            NetworkId::Polkadot => "Polkadot",
            NetworkId::Kusama => "Kusama",
            NetworkId::Westend => "Westend",
            NetworkId::Rococo => "Rococo",
            NetworkId::Ethereum { .. } => "Ethereum",
        }
    }
}

// =============================================================================
// JSON helpers
// =============================================================================

fn interior_to_json(interior: &Interior) -> Json {
    if interior.is_here() {
        return Json::String("Here".to_string());
    }
    let items: Vec<Json> = interior.junctions().iter().map(Junction::to_json).collect();
    let mut obj = Map::new();
    obj.insert(format!("X{}", items.len()), Json::Array(items));
    Json::Object(obj)
}

fn network_to_json(network: &NetworkId) -> Json {
    match network {
        NetworkId::ByGenesis(hash) => json!({ "ByGenesis": hex_str(hash) }),
        NetworkId::Ethereum { chain_id } => json!({ "Ethereum": { "chainId": chain_id } }),
        other => Json::String(other.variant_name().to_string()),
    }
}

fn network_opt_to_json(network: &Option<NetworkId>) -> Json {
    network.as_ref().map_or(Json::Null, network_to_json)
}

fn network_from_json(raw: &Json) -> Result<NetworkId, XcmError> {
    let (key, value) = match raw {
        Json::String(s) => (s.clone(), &Json::Null),
        Json::Object(obj) => single_entry(obj)?,
        other => return Err(invalid(&format!("unrecognized network: {}", other))),
    };
    match key.to_ascii_lowercase().as_str() {
        "polkadot" => Ok(NetworkId::Polkadot),
        "kusama" => Ok(NetworkId::Kusama),
        "westend" => Ok(NetworkId::Westend),
        "rococo" => Ok(NetworkId::Rococo),
        "bygenesis" => Ok(NetworkId::ByGenesis(hex_bytes::<32>(value)?)),
        "ethereum" => {
            let fields = object(value, "Ethereum")?;
            let chain_id = get_ci(fields, "chainId")
                .or_else(|| get_ci(fields, "chain_id"))
                .ok_or_else(|| invalid("missing chainId"))?;
            Ok(NetworkId::Ethereum {
                chain_id: u64::try_from(json_u128(chain_id)?)
                    .map_err(|_| invalid("chain id overflows u64"))?,
            })
        }
        other => Err(invalid(&format!("unknown network: {}", other))),
    }
}

fn network_field(fields: &Map<String, Json>) -> Result<Option<NetworkId>, XcmError> {
    match get_ci(fields, "network") {
        None | Some(Json::Null) => Ok(None),
        Some(raw) => network_from_json(raw).map(Some),
    }
}

/// Lookup with ASCII case-insensitive key comparison
pub(crate) fn get_ci<'a>(obj: &'a Map<String, Json>, key: &str) -> Option<&'a Json> {
    obj.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn single_entry(obj: &Map<String, Json>) -> Result<(String, &Json), XcmError> {
    let mut iter = obj.iter();
    match (iter.next(), iter.next()) {
        (Some((k, v)), None) => Ok((k.clone(), v)),
        _ => Err(invalid(&format!(
            "expected a single-key object, got keys {:?}",
            obj.keys().collect::<Vec<_>>()
        ))),
    }
}

fn object<'a>(raw: &'a Json, what: &str) -> Result<&'a Map<String, Json>, XcmError> {
    raw.as_object()
        .ok_or_else(|| invalid(&format!("{} must be an object", what)))
}

fn arity(key: &str) -> Option<usize> {
    let rest = key.strip_prefix('X').or_else(|| key.strip_prefix('x'))?;
    rest.parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_JUNCTIONS).contains(n))
}

fn is_version_key(key: &str) -> bool {
    matches!(key.to_ascii_uppercase().as_str(), "V3" | "V4" | "V5")
}

fn json_u128(raw: &Json) -> Result<u128, XcmError> {
    match raw {
        Json::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| invalid(&format!("expected a non-negative integer, got {}", n))),
        Json::String(s) => parse_u128(s).map_err(|e| invalid(&e)),
        other => Err(invalid(&format!("expected an integer, got {}", other))),
    }
}

fn big_to_json(value: u128) -> Json {
    match u64::try_from(value) {
        Ok(v) if value <= MAX_SAFE_INTEGER => Json::from(v),
        _ => Json::String(value.to_string()),
    }
}

fn bytes_field<const N: usize>(fields: &Map<String, Json>, key: &str) -> Result<[u8; N], XcmError> {
    let raw = get_ci(fields, key).ok_or_else(|| invalid(&format!("missing {}", key)))?;
    hex_bytes::<N>(raw)
}

fn decode_hex(raw: &Json) -> Result<Vec<u8>, XcmError> {
    let s = raw
        .as_str()
        .ok_or_else(|| invalid("expected a hex string"))?;
    let stripped = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    hex::decode(stripped).map_err(|e| invalid(&format!("invalid hex: {}", e)))
}

fn hex_bytes<const N: usize>(raw: &Json) -> Result<[u8; N], XcmError> {
    let bytes = decode_hex(raw)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| invalid(&format!("expected {} bytes, got {}", N, len)))
}

/// Right-pad a general key to 32 bytes, returning the original length
fn padded_bytes(raw: &Json) -> Result<([u8; 32], u8), XcmError> {
    let bytes = decode_hex(raw)?;
    if bytes.len() > 32 {
        return Err(invalid("general key data exceeds 32 bytes"));
    }
    let mut data = [0u8; 32];
    data[..bytes.len()].copy_from_slice(&bytes);
    Ok((data, bytes.len() as u8))
}

fn hex_str(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn invalid(msg: &str) -> XcmError {
    XcmError::InvalidParameter(format!("Invalid location: {}", msg))
}
