//! The typed message a wallet signs to authorize user decryption.

use std::borrow::Cow;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, sol};
use ghostvote_types::{DecryptionAuthorization, Timestamp};

use crate::AuthorizationError;

sol! {
    struct UserDecryptRequestVerification {
        bytes publicKey;
        address[] contractAddresses;
        uint256 startTimestamp;
        uint256 durationDays;
    }
}

/// Domain of the decryption verifier deployed on `chain_id` at `verifying_contract`.
pub fn domain(chain_id: u64, verifying_contract: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed("Decryption")),
        Some(Cow::Borrowed("1")),
        Some(U256::from(chain_id)),
        Some(verifying_contract),
        None,
    )
}

/// Hash the wallet signs for an authorization request.
///
/// `contracts` must already be sorted and deduplicated.
pub fn signing_hash(
    domain: &Eip712Domain,
    public_key: &Bytes,
    contracts: &[Address],
    start: Timestamp,
    duration_days: u32,
) -> B256 {
    let request = UserDecryptRequestVerification {
        publicKey: public_key.clone(),
        contractAddresses: contracts.to_vec(),
        startTimestamp: U256::from(u64::from(start)),
        durationDays: U256::from(duration_days),
    };
    request.eip712_signing_hash(domain)
}

/// Check that `auth` carries a signature of its own signer over its own fields.
pub fn verify(domain: &Eip712Domain, auth: &DecryptionAuthorization) -> Result<(), AuthorizationError> {
    let hash = signing_hash(
        domain,
        auth.public_key(),
        auth.contracts(),
        auth.valid_from(),
        auth.duration_days(),
    );
    let recovered = auth.signature().recover_address_from_prehash(&hash)?;
    if recovered != auth.signer() {
        return Err(AuthorizationError::SignerMismatch {
            expected: auth.signer(),
            recovered,
        });
    }
    Ok(())
}
