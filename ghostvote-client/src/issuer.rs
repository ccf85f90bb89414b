use alloy_primitives::Address;
use alloy_signer::Signer;
use ghostvote_types::{DecryptionAuthorization, Timestamp};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::AuthorizationError;
use crate::eip712;
use crate::traits::DecryptionCapability;

/// Issues decryption authorizations and keeps the last one for reuse.
///
/// An authorization is reused while it is valid, belongs to the requesting
/// wallet and covers the requested contracts. Expired authorizations are
/// never renewed in the background; the next request simply signs anew.
#[derive(Debug)]
pub struct SignatureIssuer {
    validity_days: u32,
    // Held across the wallet prompt so concurrent requests share one signature.
    cache: Mutex<Option<DecryptionAuthorization>>,
}

impl SignatureIssuer {
    pub fn new(validity_days: u32) -> Self {
        Self {
            validity_days,
            cache: Mutex::new(None),
        }
    }

    pub fn validity_days(&self) -> u32 {
        self.validity_days
    }

    /// A cached authorization usable for the request, if any.
    pub async fn cached(
        &self,
        signer: Address,
        contracts: &[Address],
        now: Timestamp,
    ) -> Option<DecryptionAuthorization> {
        let cache = self.cache.lock().await;
        cache
            .as_ref()
            .filter(|a| usable(a, signer, contracts, now))
            .cloned()
    }

    /// Return a usable authorization, prompting `wallet` if there is none.
    pub async fn obtain(
        &self,
        decrypter: &dyn DecryptionCapability,
        wallet: &(dyn Signer + Send + Sync),
        contracts: &[Address],
        now: Timestamp,
    ) -> Result<DecryptionAuthorization, AuthorizationError> {
        if contracts.is_empty() {
            return Err(AuthorizationError::NoContracts);
        }

        let signer = wallet.address();
        let mut cache = self.cache.lock().await;

        if let Some(auth) = cache.as_ref() {
            if usable(auth, signer, contracts, now) {
                debug!(%signer, until = %auth.valid_until(), "reusing decryption authorization");
                return Ok(auth.clone());
            }
            debug!(
                %signer,
                valid_from = %auth.valid_from(),
                until = %auth.valid_until(),
                "cached decryption authorization not usable"
            );
        }

        let mut contracts = contracts.to_vec();
        contracts.sort();
        contracts.dedup();

        let keypair = decrypter.generate_keypair();
        let hash = eip712::signing_hash(
            &decrypter.eip712_domain(),
            keypair.public_key(),
            &contracts,
            now,
            self.validity_days,
        );

        info!(%signer, contracts = contracts.len(), days = self.validity_days, "requesting decryption signature");

        let signature = wallet.sign_hash(&hash).await.map_err(|err| {
            warn!(%signer, %err, "wallet did not sign decryption request");
            AuthorizationError::Rejected(err)
        })?;

        let recovered = signature.recover_address_from_prehash(&hash)?;
        if recovered != signer {
            warn!(%signer, %recovered, "decryption signature from unexpected key");
            return Err(AuthorizationError::SignerMismatch {
                expected: signer,
                recovered,
            });
        }

        let auth = DecryptionAuthorization::new(
            keypair,
            signature,
            contracts,
            signer,
            now,
            self.validity_days,
        );
        *cache = Some(auth.clone());
        Ok(auth)
    }

    /// Forget the cached authorization.
    pub async fn clear(&self) {
        self.cache.lock().await.take();
    }
}

fn usable(
    auth: &DecryptionAuthorization,
    signer: Address,
    contracts: &[Address],
    now: Timestamp,
) -> bool {
    auth.signer() == signer && auth.is_valid_at(now) && auth.covers(contracts)
}
