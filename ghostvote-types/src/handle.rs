use std::fmt;
use std::str::FromStr;

use alloy_primitives::{B256, Bytes, FixedBytes, hex};
use serde::{Deserialize, Serialize};

/// Width in bytes of a ciphertext handle.
pub const HANDLE_WIDTH: usize = 32;

/// Opaque reference to an encrypted scalar stored by a contract.
///
/// The all-zero value is the sentinel for "no ciphertext written yet". It
/// never names a real ciphertext and must not be submitted for decryption.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CiphertextHandle(FixedBytes<HANDLE_WIDTH>);

impl CiphertextHandle {
    pub const SENTINEL: Self = Self(FixedBytes::ZERO);

    pub const fn new(bytes: [u8; HANDLE_WIDTH]) -> Self {
        Self(FixedBytes(bytes))
    }

    pub fn is_sentinel(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_bytes(&self) -> &[u8; HANDLE_WIDTH] {
        &self.0.0
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<B256> for CiphertextHandle {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<CiphertextHandle> for B256 {
    fn from(value: CiphertextHandle) -> Self {
        value.0
    }
}

impl From<[u8; HANDLE_WIDTH]> for CiphertextHandle {
    fn from(value: [u8; HANDLE_WIDTH]) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ciphertext handle {0:?}: expected 0x followed by {n} hex digits", n = 2 * HANDLE_WIDTH)]
pub struct InvalidHandle(String);

impl FromStr for CiphertextHandle {
    type Err = InvalidHandle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| InvalidHandle(s.to_string()))?;
        if digits.len() != 2 * HANDLE_WIDTH {
            return Err(InvalidHandle(s.to_string()));
        }
        let mut bytes = [0; HANDLE_WIDTH];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| InvalidHandle(s.to_string()))?;
        Ok(Self::new(bytes))
    }
}

/// An encrypted input together with the proof binding it to a contract and user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub handle: CiphertextHandle,
    pub proof: Bytes,
}
