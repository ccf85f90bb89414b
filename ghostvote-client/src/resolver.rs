use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use ghostvote_types::{BallotEntry, CiphertextHandle, DecryptionAuthorization};
use tracing::{debug, warn};

use crate::DecryptError;
use crate::traits::{DecryptionCapability, HandleContractPair};

/// The handles of one batch, sentinel-free and without repetitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionRequest {
    pairs: Vec<HandleContractPair>,
}

impl ResolutionRequest {
    /// Build a request for `handles` owned by `contract`.
    ///
    /// Sentinels are dropped. Of repeated handles only the first is kept.
    pub fn new<I>(contract: Address, handles: I) -> Self
    where
        I: IntoIterator<Item = CiphertextHandle>,
    {
        let mut seen = HashSet::new();
        let pairs = handles
            .into_iter()
            .filter(|h| !h.is_sentinel() && seen.insert(*h))
            .map(|handle| HandleContractPair { handle, contract })
            .collect();
        Self { pairs }
    }

    pub fn from_entries(contract: Address, entries: &[BallotEntry]) -> Self {
        Self::new(contract, entries.iter().map(|e| e.handle))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn pairs(&self) -> &[HandleContractPair] {
        &self.pairs
    }

    pub fn contains(&self, h: &CiphertextHandle) -> bool {
        self.pairs.iter().any(|p| p.handle == *h)
    }
}

/// Plaintexts of one batch, by handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    values: HashMap<CiphertextHandle, U256>,
}

impl ResolutionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The plaintext of `h`. The sentinel is always zero.
    pub fn get(&self, h: &CiphertextHandle) -> Option<U256> {
        if h.is_sentinel() {
            return Some(U256::ZERO);
        }
        self.values.get(h).copied()
    }

    /// One value per entry, in entry order.
    pub fn distribute(&self, entries: &[BallotEntry]) -> Result<Vec<U256>, DecryptError> {
        entries
            .iter()
            .map(|e| self.get(&e.handle).ok_or(DecryptError::Incomplete(e.handle)))
            .collect()
    }
}

/// Decrypts a batch of handles in a single capability call.
#[derive(Clone)]
pub struct BatchResolver {
    decrypter: Arc<dyn DecryptionCapability>,
}

impl BatchResolver {
    pub fn new(decrypter: Arc<dyn DecryptionCapability>) -> Self {
        Self { decrypter }
    }

    pub async fn resolve(
        &self,
        req: &ResolutionRequest,
        auth: &DecryptionAuthorization,
    ) -> Result<ResolutionResult, DecryptError> {
        if req.is_empty() {
            debug!("nothing to decrypt");
            return Ok(ResolutionResult::empty());
        }

        let mut reply = self.decrypter.user_decrypt(req.pairs(), auth).await?;

        let mut values = HashMap::with_capacity(req.len());
        for p in req.pairs() {
            let Some(v) = reply.remove(&p.handle) else {
                warn!(handle = %p.handle, "decryption reply misses a handle");
                return Err(DecryptError::Incomplete(p.handle));
            };
            values.insert(p.handle, v);
        }
        if !reply.is_empty() {
            debug!(extra = reply.len(), "ignoring unrequested plaintexts");
        }

        debug!(handles = values.len(), "resolved batch");
        Ok(ResolutionResult { values })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use alloy_primitives::{Address, Bytes, U256};
    use alloy_sol_types::Eip712Domain;
    use async_trait::async_trait;
    use ghostvote_types::{
        BallotEntry, CiphertextHandle, DecryptionAuthorization, EphemeralKeypair, PrivateKey,
        ProposalId, Timestamp,
    };
    use quickcheck::quickcheck;

    use super::{BatchResolver, ResolutionRequest};
    use crate::traits::{DecryptionCapability, HandleContractPair};
    use crate::{CapabilityError, DecryptError, eip712};

    const C: Address = Address::repeat_byte(7);

    fn h(b: u8) -> CiphertextHandle {
        CiphertextHandle::new([b; 32])
    }

    fn entry(id: u64, handle: CiphertextHandle) -> BallotEntry {
        BallotEntry {
            id: ProposalId::from(id),
            handle,
            author: Address::ZERO,
            title: String::new(),
        }
    }

    fn auth() -> DecryptionAuthorization {
        let kp = EphemeralKeypair::new(Bytes::from(vec![1; 32]), PrivateKey::new(vec![2; 32]));
        let sig = alloy_primitives::Signature::new(U256::from(1), U256::from(1), false);
        DecryptionAuthorization::new(kp, sig, vec![C], Address::ZERO, Timestamp::from(0), 1)
    }

    /// Answers with a fixed table, omitting handles it does not know.
    struct Table(HashMap<CiphertextHandle, U256>);

    #[async_trait]
    impl DecryptionCapability for Table {
        fn generate_keypair(&self) -> EphemeralKeypair {
            EphemeralKeypair::new(Bytes::new(), PrivateKey::new(Vec::new()))
        }

        fn eip712_domain(&self) -> Eip712Domain {
            eip712::domain(1, Address::ZERO)
        }

        async fn user_decrypt(
            &self,
            pairs: &[HandleContractPair],
            _: &DecryptionAuthorization,
        ) -> Result<HashMap<CiphertextHandle, U256>, CapabilityError> {
            Ok(pairs
                .iter()
                .filter_map(|p| self.0.get(&p.handle).map(|v| (p.handle, *v)))
                .collect())
        }
    }

    #[test]
    fn request_drops_sentinels_and_repetitions() {
        let req = ResolutionRequest::new(C, [h(0), h(0xaa), h(0xbb), h(0xaa), h(0)]);
        let handles = req.pairs().iter().map(|p| p.handle).collect::<Vec<_>>();
        assert_eq!(handles, [h(0xaa), h(0xbb)]);
        assert!(req.pairs().iter().all(|p| p.contract == C));
        assert!(!req.contains(&CiphertextHandle::SENTINEL));
        assert!(ResolutionRequest::new(C, [h(0)]).is_empty());
    }

    #[tokio::test]
    async fn values_are_distributed() {
        let table = Table([(h(0xaa), U256::from(3)), (h(0xbb), U256::from(5))].into());
        let resolver = BatchResolver::new(Arc::new(table));
        let entries = [entry(1, h(0)), entry(2, h(0xaa)), entry(3, h(0xbb)), entry(4, h(0xaa))];
        let req = ResolutionRequest::from_entries(C, &entries);
        let res = resolver.resolve(&req, &auth()).await.unwrap();
        assert_eq!(
            res.distribute(&entries).unwrap(),
            [U256::ZERO, U256::from(3), U256::from(5), U256::from(3)]
        );
    }

    #[tokio::test]
    async fn incomplete_reply_fails() {
        let table = Table([(h(0xaa), U256::from(3))].into());
        let resolver = BatchResolver::new(Arc::new(table));
        let req = ResolutionRequest::new(C, [h(0xaa), h(0xbb)]);
        let res = resolver.resolve(&req, &auth()).await;
        assert!(matches!(res, Err(DecryptError::Incomplete(x)) if x == h(0xbb)));
    }

    quickcheck! {
        fn request_is_sentinel_free_and_unique(bytes: Vec<u8>) -> bool {
            let handles = bytes.iter().map(|b| h(*b % 4)).collect::<Vec<_>>();
            let req = ResolutionRequest::new(C, handles.clone());
            let mut seen = std::collections::HashSet::new();
            req.pairs().iter().all(|p| !p.handle.is_sentinel() && seen.insert(p.handle))
                && handles.iter().all(|x| x.is_sentinel() || req.contains(x))
        }
    }
}
