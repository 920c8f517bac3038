//! Call encoding using subxt dynamic API
//!
//! An [`XcmCall`] names a pallet, a method and its arguments as
//! `scale_value` values. [`RuntimeEncoder`] turns it into call data using a
//! chain's runtime metadata; nothing here touches the network.

use crate::error::XcmError;
use crate::types::Chain;
use blake2::{digest::consts::U32, Blake2b, Digest};
use parity_scale_codec::Decode;
use serde::{Serialize, Serializer};
use subxt_core::{
    ext::scale_value::{Composite, Value},
    metadata::Metadata,
    tx::payload::{dynamic, DynamicPayload, Payload},
};

/// Runtime call by pallet, method and named arguments
#[derive(Debug, Clone, PartialEq)]
pub struct XcmCall {
    pub module: String,
    pub method: String,
    pub fields: Vec<(String, Value<()>)>,
}

impl XcmCall {
    pub fn new<const N: usize>(module: &str, method: &str, fields: [(&str, Value<()>); N]) -> Self {
        XcmCall {
            module: module.to_string(),
            method: method.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    pub fn payload(&self) -> DynamicPayload {
        dynamic(
            self.module.as_str(),
            self.method.as_str(),
            Composite::Named(self.fields.clone()),
        )
    }

    /// `RuntimeCall::Module(Call::method { .. })`, for nesting in batch and sudo
    pub fn as_runtime_call_value(&self) -> Value<()> {
        Value::unnamed_variant(
            self.module.as_str(),
            [Value::named_variant(
                self.method.as_str(),
                self.fields.iter().cloned(),
            )],
        )
    }

    /// Human-readable arguments; for debugging only
    pub fn parameters(&self) -> String {
        Value::named_composite(self.fields.iter().cloned()).to_string()
    }

    pub fn name(&self) -> String {
        format!("{}.{}", self.module, self.method)
    }
}

/// Encoded call ready for signing, with a readable echo
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedCall {
    pub chain: Chain,
    pub module: String,
    pub method: String,
    /// Not authoritative; only `data` is submitted
    pub parameters: String,
    #[serde(rename = "hex", serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl EncodedCall {
    pub fn new(chain: &Chain, call: &XcmCall, data: Vec<u8>) -> Self {
        EncodedCall {
            chain: chain.clone(),
            module: call.module.clone(),
            method: call.method.clone(),
            parameters: call.parameters(),
            data,
        }
    }

    pub fn hex(&self) -> String {
        format!("0x{}", hex::encode(&self.data))
    }

    /// Blake2-256 of the call data
    pub fn hash(&self) -> [u8; 32] {
        blake2_256(&self.data)
    }
}

fn serialize_hex<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(data)))
}

/// Encodes calls against one runtime's metadata
#[derive(Debug, Clone)]
pub struct RuntimeEncoder {
    metadata: Metadata,
}

impl RuntimeEncoder {
    pub fn new(metadata: Metadata) -> Self {
        RuntimeEncoder { metadata }
    }

    /// Decode SCALE-encoded runtime metadata (as returned by `state_getMetadata`)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XcmError> {
        let metadata = Metadata::decode(&mut &bytes[..])?;
        Ok(RuntimeEncoder { metadata })
    }

    pub fn from_hex(metadata_hex: &str) -> Result<Self, XcmError> {
        let stripped = metadata_hex.strip_prefix("0x").unwrap_or(metadata_hex);
        let bytes = hex::decode(stripped)
            .map_err(|e| XcmError::InvalidParameter(format!("Invalid metadata hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn encode(&self, call: &XcmCall) -> Result<Vec<u8>, XcmError> {
        self.call_index(&call.module, &call.method)?;
        call.payload()
            .encode_call_data(&self.metadata)
            .map_err(|e| XcmError::Encoding(format!("Failed to encode {}: {}", call.name(), e)))
    }

    /// Pallet and call index from metadata
    pub fn call_index(&self, pallet: &str, method: &str) -> Result<(u8, u8), XcmError> {
        let p = self.metadata.pallet_by_name(pallet).ok_or_else(|| {
            XcmError::ChainNotSupported(format!("{} pallet not found in runtime", pallet))
        })?;
        let c = p.call_variant_by_name(method).ok_or_else(|| {
            XcmError::ChainNotSupported(format!("{}.{} not found in runtime", pallet, method))
        })?;
        Ok((p.index(), c.index))
    }
}

/// Blake2-256 hash
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}
