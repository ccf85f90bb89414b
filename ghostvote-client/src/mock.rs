//! In-memory stand-ins for the encryption runtime and the ballot contract.
//!
//! Together they form a local mock chain: [`MockFhe`] keeps plaintexts next
//! to the handles it hands out and [`MockBallot`] adds encrypted inputs the
//! way the contract does homomorphically.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, TxHash, U256};
use alloy_sol_types::Eip712Domain;
use async_trait::async_trait;
use ghostvote_types::{
    Category, CiphertextHandle, DecryptionAuthorization, EncryptedInput, EphemeralKeypair,
    NewProposal, PrivateKey, ProposalId, ProposalRecord, Timestamp,
};
use parking_lot::Mutex;
use rand::Rng;
use tracing::debug;

use crate::eip712;
use crate::traits::{
    BallotContract, DecryptionCapability, EncryptionCapability, HandleContractPair,
};
use crate::{CapabilityError, ContractError};

/// Mock homomorphic encryption runtime.
#[derive(Debug)]
pub struct MockFhe {
    domain: Eip712Domain,
    inner: Mutex<Store>,
}

#[derive(Debug, Default)]
struct Store {
    values: HashMap<CiphertextHandle, U256>,
    requests: Vec<Vec<HandleContractPair>>,
    now: Option<Timestamp>,
    failure: Option<String>,
}

impl MockFhe {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            domain: eip712::domain(chain_id, verifying_contract),
            inner: Mutex::new(Store::default()),
        }
    }

    /// Encrypt `value` under a fresh handle.
    pub fn store(&self, value: U256) -> CiphertextHandle {
        let h = fresh_handle();
        self.inner.lock().values.insert(h, value);
        h
    }

    /// Store `value` under a given handle.
    pub fn store_at(&self, h: CiphertextHandle, value: U256) {
        debug_assert!(!h.is_sentinel());
        self.inner.lock().values.insert(h, value);
    }

    /// Homomorphic addition. The sentinel counts as an encrypted zero.
    pub fn add(&self, a: CiphertextHandle, b: CiphertextHandle) -> CiphertextHandle {
        let h = fresh_handle();
        let mut store = self.inner.lock();
        let x = store.values.get(&a).copied().unwrap_or_default();
        let y = store.values.get(&b).copied().unwrap_or_default();
        store.values.insert(h, x.saturating_add(y));
        h
    }

    /// Every batch submitted to [`DecryptionCapability::user_decrypt`] so far.
    pub fn requests(&self) -> Vec<Vec<HandleContractPair>> {
        self.inner.lock().requests.clone()
    }

    /// Pin the clock used to check authorization windows.
    pub fn set_time(&self, now: Timestamp) {
        self.inner.lock().now = Some(now)
    }

    /// Make the next decryption request fail with `reason`.
    pub fn fail_next<S: Into<String>>(&self, reason: S) {
        self.inner.lock().failure = Some(reason.into())
    }
}

#[async_trait]
impl DecryptionCapability for MockFhe {
    fn generate_keypair(&self) -> EphemeralKeypair {
        let secret: [u8; 32] = rand::rng().random();
        let public = blake3::hash(&secret);
        EphemeralKeypair::new(
            Bytes::copy_from_slice(public.as_bytes()),
            PrivateKey::new(secret.to_vec()),
        )
    }

    fn eip712_domain(&self) -> Eip712Domain {
        self.domain.clone()
    }

    async fn user_decrypt(
        &self,
        pairs: &[HandleContractPair],
        auth: &DecryptionAuthorization,
    ) -> Result<HashMap<CiphertextHandle, U256>, CapabilityError> {
        let mut store = self.inner.lock();
        store.requests.push(pairs.to_vec());

        if let Some(reason) = store.failure.take() {
            return Err(CapabilityError::other(std::io::Error::other(reason)));
        }

        eip712::verify(&self.domain, auth)
            .map_err(|e| CapabilityError::Unauthorized(e.to_string()))?;

        let now = store.now.unwrap_or_else(Timestamp::now);
        if !auth.is_valid_at(now) {
            return Err(CapabilityError::Unauthorized(format!(
                "authorization not valid at {now}"
            )));
        }

        let mut result = HashMap::new();
        for p in pairs {
            if p.handle.is_sentinel() {
                return Err(CapabilityError::SentinelHandle);
            }
            if !auth.covers(&[p.contract]) {
                return Err(CapabilityError::Unauthorized(format!(
                    "contract {} not authorized",
                    p.contract
                )));
            }
            let v = store
                .values
                .get(&p.handle)
                .copied()
                .ok_or(CapabilityError::UnknownHandle(p.handle))?;
            result.insert(p.handle, v);
        }
        debug!(handles = result.len(), "mock decryption");
        Ok(result)
    }
}

#[async_trait]
impl EncryptionCapability for MockFhe {
    async fn encrypt_u32(
        &self,
        contract: Address,
        user: Address,
        value: u32,
    ) -> Result<EncryptedInput, CapabilityError> {
        let handle = self.store(U256::from(value));
        let mut hasher = blake3::Hasher::new();
        hasher.update(handle.as_bytes());
        hasher.update(contract.as_slice());
        hasher.update(user.as_slice());
        Ok(EncryptedInput {
            handle,
            proof: Bytes::copy_from_slice(hasher.finalize().as_bytes()),
        })
    }
}

/// Mock ballot contract backed by a [`MockFhe`].
#[derive(Debug)]
pub struct MockBallot {
    address: Address,
    sender: Address,
    fhe: Arc<MockFhe>,
    inner: Mutex<Ledger>,
}

#[derive(Debug, Default)]
struct Ledger {
    proposals: BTreeMap<ProposalId, ProposalRecord>,
    ballots: HashMap<(ProposalId, Category), CiphertextHandle>,
    likes: HashMap<ProposalId, CiphertextHandle>,
    next_id: u64,
    offline: bool,
}

impl MockBallot {
    /// A contract at `address` whose transactions are sent by `sender`.
    pub fn new(address: Address, sender: Address, fhe: Arc<MockFhe>) -> Self {
        Self {
            address,
            sender,
            fhe,
            inner: Mutex::new(Ledger {
                next_id: 1,
                ..Ledger::default()
            }),
        }
    }

    /// Overwrite the vote counter of a proposal in a category.
    pub fn set_ballot(&self, id: ProposalId, c: Category, h: CiphertextHandle) {
        self.inner.lock().ballots.insert((id, c), h);
    }

    /// Make every call fail as if the node was unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline
    }

    fn ledger(&self) -> Result<parking_lot::MutexGuard<'_, Ledger>, ContractError> {
        let ledger = self.inner.lock();
        if ledger.offline {
            return Err(ContractError::call(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock chain offline",
            )));
        }
        Ok(ledger)
    }

    fn ensure_exists(ledger: &Ledger, id: ProposalId) -> Result<(), ContractError> {
        if ledger.proposals.contains_key(&id) {
            Ok(())
        } else {
            Err(ContractError::UnknownProposal(id))
        }
    }
}

#[async_trait]
impl BallotContract for MockBallot {
    fn address(&self) -> Address {
        self.address
    }

    async fn list_proposal_ids(&self) -> Result<Vec<ProposalId>, ContractError> {
        Ok(self.ledger()?.proposals.keys().copied().collect())
    }

    async fn fetch_proposal(&self, id: ProposalId) -> Result<ProposalRecord, ContractError> {
        self.ledger()?
            .proposals
            .get(&id)
            .cloned()
            .ok_or(ContractError::UnknownProposal(id))
    }

    async fn ballot_handle_of(
        &self,
        id: ProposalId,
        category: Category,
    ) -> Result<CiphertextHandle, ContractError> {
        let ledger = self.ledger()?;
        Self::ensure_exists(&ledger, id)?;
        Ok(ledger
            .ballots
            .get(&(id, category))
            .copied()
            .unwrap_or(CiphertextHandle::SENTINEL))
    }

    async fn likes_handle_of(&self, id: ProposalId) -> Result<CiphertextHandle, ContractError> {
        let ledger = self.ledger()?;
        Self::ensure_exists(&ledger, id)?;
        Ok(ledger
            .likes
            .get(&id)
            .copied()
            .unwrap_or(CiphertextHandle::SENTINEL))
    }

    async fn register_proposal(&self, p: &NewProposal) -> Result<TxHash, ContractError> {
        let mut ledger = self.ledger()?;
        let id = ProposalId::from(ledger.next_id);
        ledger.next_id += 1;
        let record = ProposalRecord {
            id,
            author: self.sender,
            title: p.title.clone(),
            description_ref: p.description_ref.clone(),
            file_ref: p.file_ref.clone(),
            tags: p.tags.clone(),
            categories: p.categories.iter().copied().collect::<BTreeSet<_>>(),
        };
        ledger.proposals.insert(id, record);
        Ok(fresh_tx())
    }

    async fn vote(
        &self,
        id: ProposalId,
        category: Category,
        input: &EncryptedInput,
    ) -> Result<TxHash, ContractError> {
        let mut ledger = self.ledger()?;
        let Some(record) = ledger.proposals.get(&id) else {
            return Err(ContractError::UnknownProposal(id));
        };
        if !record.is_member(category) {
            return Err(ContractError::Malformed(format!(
                "proposal {id} is not in {category}"
            )));
        }
        let current = ledger
            .ballots
            .get(&(id, category))
            .copied()
            .unwrap_or(CiphertextHandle::SENTINEL);
        let next = self.fhe.add(current, input.handle);
        ledger.ballots.insert((id, category), next);
        Ok(fresh_tx())
    }

    async fn like(&self, id: ProposalId, input: &EncryptedInput) -> Result<TxHash, ContractError> {
        let mut ledger = self.ledger()?;
        Self::ensure_exists(&ledger, id)?;
        let current = ledger
            .likes
            .get(&id)
            .copied()
            .unwrap_or(CiphertextHandle::SENTINEL);
        let next = self.fhe.add(current, input.handle);
        ledger.likes.insert(id, next);
        Ok(fresh_tx())
    }
}

fn fresh_handle() -> CiphertextHandle {
    loop {
        let h = CiphertextHandle::new(rand::rng().random());
        if !h.is_sentinel() {
            return h;
        }
    }
}

fn fresh_tx() -> TxHash {
    B256::from(rand::rng().random::<[u8; 32]>())
}
