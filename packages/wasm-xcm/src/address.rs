//! Account address handling for Substrate (SS58) and EVM (20-byte) chains
//!
//! Uses the official bs58 crate for base58 encoding, matching the Substrate ecosystem.
//! See: https://docs.substrate.io/reference/address-formats/

use crate::error::XcmError;
use crate::location::Junction;
use crate::types::AccountScheme;
use blake2::{Blake2b512, Digest};

/// SS58 prefix for checksum calculation
const SS58_PREFIX: &[u8] = b"SS58PRE";

/// Decoded account bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountBytes {
    Id32([u8; 32]),
    Key20([u8; 20]),
}

impl AccountBytes {
    /// Beneficiary junction for this account
    pub fn junction(self) -> Junction {
        match self {
            AccountBytes::Id32(id) => Junction::AccountId32 { network: None, id },
            AccountBytes::Key20(key) => Junction::AccountKey20 { network: None, key },
        }
    }
}

/// Encode a public key to SS58 address format
///
/// # Arguments
/// * `public_key` - 32-byte public key
/// * `prefix` - Network prefix (0 for Polkadot, 2 for Kusama, 42 for generic Substrate)
pub fn encode_ss58(public_key: &[u8], prefix: u16) -> Result<String, XcmError> {
    if public_key.len() != 32 {
        return Err(XcmError::InvalidAddress(format!(
            "Public key must be 32 bytes, got {}",
            public_key.len()
        )));
    }

    let mut payload = encode_prefix(prefix)?;
    payload.extend_from_slice(public_key);

    let checksum = ss58_checksum(&payload);
    payload.extend_from_slice(&checksum[..2]);

    Ok(bs58::encode(&payload).into_string())
}

/// Decode an SS58 address to public key and prefix
pub fn decode_ss58(address: &str) -> Result<([u8; 32], u16), XcmError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| XcmError::InvalidAddress(format!("Invalid base58: {}", e)))?;

    if decoded.len() < 35 {
        return Err(XcmError::InvalidAddress("Address too short".to_string()));
    }

    let (prefix, prefix_len) = decode_prefix(&decoded)?;

    let checksum_start = decoded.len() - 2;
    let public_key = &decoded[prefix_len..checksum_start];
    let checksum = &decoded[checksum_start..];

    let public_key: [u8; 32] = public_key.try_into().map_err(|_| {
        XcmError::InvalidAddress(format!("Invalid public key length: {}", public_key.len()))
    })?;

    let expected_checksum = ss58_checksum(&decoded[..checksum_start]);
    if checksum != &expected_checksum[..2] {
        return Err(XcmError::InvalidAddress("Invalid checksum".to_string()));
    }

    Ok((public_key, prefix))
}

/// Decode an address according to the chain's account scheme
///
/// Substrate chains accept SS58 or a raw 0x-prefixed 32-byte public key;
/// EVM chains accept a 0x-prefixed 20-byte key.
pub fn decode_account(address: &str, scheme: AccountScheme) -> Result<AccountBytes, XcmError> {
    match scheme {
        AccountScheme::Substrate => {
            if let Some(bytes) = decode_hex_account::<32>(address)? {
                return Ok(AccountBytes::Id32(bytes));
            }
            let (pubkey, _) = decode_ss58(address)?;
            Ok(AccountBytes::Id32(pubkey))
        }
        AccountScheme::Evm => decode_hex_account::<20>(address)?
            .map(AccountBytes::Key20)
            .ok_or_else(|| {
                XcmError::InvalidAddress(format!("{} is not a 20-byte EVM address", address))
            }),
    }
}

/// Validate an address for an account scheme
pub fn validate_address(address: &str, scheme: AccountScheme) -> bool {
    decode_account(address, scheme).is_ok()
}

/// Beneficiary junction for an address on a chain with the given scheme
pub fn beneficiary_junction(address: &str, scheme: AccountScheme) -> Result<Junction, XcmError> {
    Ok(decode_account(address, scheme)?.junction())
}

/// Decode a 0x hex account of exactly `N` bytes; `Ok(None)` when not hex-prefixed
fn decode_hex_account<const N: usize>(address: &str) -> Result<Option<[u8; N]>, XcmError> {
    let Some(stripped) = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
    else {
        return Ok(None);
    };
    let bytes = hex::decode(stripped)
        .map_err(|e| XcmError::InvalidAddress(format!("Invalid hex address: {}", e)))?;
    let len = bytes.len();
    bytes.try_into().map(Some).map_err(|_| {
        XcmError::InvalidAddress(format!("Expected {} address bytes, got {}", N, len))
    })
}

/// Encode SS58 prefix (supports single and two-byte prefixes)
fn encode_prefix(prefix: u16) -> Result<Vec<u8>, XcmError> {
    if prefix < 64 {
        Ok(vec![prefix as u8])
    } else if prefix < 16384 {
        let first = ((prefix & 0b0000_0000_1111_1100) as u8) >> 2 | 0b0100_0000;
        let second = ((prefix >> 8) as u8) | ((prefix & 0b0000_0000_0000_0011) as u8) << 6;
        Ok(vec![first, second])
    } else {
        Err(XcmError::InvalidAddress(format!("Invalid prefix: {}", prefix)))
    }
}

/// Decode SS58 prefix from raw bytes
fn decode_prefix(data: &[u8]) -> Result<(u16, usize), XcmError> {
    if data[0] < 64 {
        Ok((data[0] as u16, 1))
    } else if data[0] < 128 {
        if data.len() < 2 {
            return Err(XcmError::InvalidAddress(
                "Address too short for two-byte prefix".to_string(),
            ));
        }
        let lower = (data[0] & 0b0011_1111) << 2 | (data[1] >> 6);
        let upper = data[1] & 0b0011_1111;
        Ok((((upper as u16) << 8) | (lower as u16), 2))
    } else {
        Err(XcmError::InvalidAddress(format!(
            "Invalid prefix byte: {}",
            data[0]
        )))
    }
}

/// Calculate SS58 checksum (Blake2b-512 of "SS58PRE" || payload)
fn ss58_checksum(payload: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX);
    hasher.update(payload);
    let result = hasher.finalize();
    let mut checksum = [0u8; 64];
    checksum.copy_from_slice(&result);
    checksum
}
