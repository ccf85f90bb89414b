use std::fmt;

use alloy_primitives::{Address, Bytes, Signature};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::Timestamp;

/// Secret half of an ephemeral decryption keypair.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// Keypair the decryption capability re-encrypts plaintexts under.
#[derive(Debug, Clone)]
pub struct EphemeralKeypair {
    public: Bytes,
    private: PrivateKey,
}

impl EphemeralKeypair {
    pub fn new(public: Bytes, private: PrivateKey) -> Self {
        Self { public, private }
    }

    pub fn public_key(&self) -> &Bytes {
        &self.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }
}

/// A wallet-signed permission to decrypt ciphertexts of a set of contracts.
///
/// Valid from `valid_from` (inclusive) for `duration_days` whole days.
#[derive(Debug, Clone)]
pub struct DecryptionAuthorization {
    keypair: EphemeralKeypair,
    signature: Signature,
    contracts: Vec<Address>,
    signer: Address,
    valid_from: Timestamp,
    duration_days: u32,
}

impl DecryptionAuthorization {
    /// The contract list is stored sorted and without duplicates.
    pub fn new(
        keypair: EphemeralKeypair,
        signature: Signature,
        mut contracts: Vec<Address>,
        signer: Address,
        valid_from: Timestamp,
        duration_days: u32,
    ) -> Self {
        contracts.sort();
        contracts.dedup();
        Self {
            keypair,
            signature,
            contracts,
            signer,
            valid_from,
            duration_days,
        }
    }

    pub fn public_key(&self) -> &Bytes {
        self.keypair.public_key()
    }

    pub fn private_key(&self) -> &PrivateKey {
        self.keypair.private_key()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The 65 byte `r || s || v` encoding of the signature.
    pub fn signature_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.signature.as_bytes())
    }

    pub fn contracts(&self) -> &[Address] {
        &self.contracts
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn valid_from(&self) -> Timestamp {
        self.valid_from
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    /// First instant at which the authorization is no longer valid.
    pub fn valid_until(&self) -> Timestamp {
        self.valid_from.add_days(self.duration_days)
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.valid_from <= now && now < self.valid_until()
    }

    /// Does the authorization extend to all of the given contracts?
    pub fn covers(&self, contracts: &[Address]) -> bool {
        contracts
            .iter()
            .all(|c| self.contracts.binary_search(c).is_ok())
    }
}
