#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use alloy_primitives::{Address, B256, ChainId, Signature, U256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::Eip712Domain;
use async_trait::async_trait;
use ghostvote_client::mock::{MockBallot, MockFhe};
use ghostvote_client::traits::{BallotContract, DecryptionCapability, HandleContractPair};
use ghostvote_client::{CapabilityError, Session, SessionConfig};
use ghostvote_types::{
    Category, CiphertextHandle, DecryptionAuthorization, EphemeralKeypair, NewProposal,
    ProposalId,
};
use tokio::sync::Notify;

pub const CONTRACT: Address = Address::repeat_byte(0xc0);
pub const VERIFIER: Address = Address::repeat_byte(0xde);

/// A wallet that counts prompts and can be told to refuse them.
pub struct Wallet {
    key: PrivateKeySigner,
    refuse: AtomicBool,
    prompts: AtomicUsize,
}

impl Wallet {
    pub fn new() -> Self {
        Self {
            key: PrivateKeySigner::random(),
            refuse: AtomicBool::new(false),
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn refuse(&self, yes: bool) {
        self.refuse.store(yes, Ordering::SeqCst)
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for Wallet {
    async fn sign_hash(&self, hash: &B256) -> alloy_signer::Result<Signature> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(alloy_signer::Error::other("user rejected the request"));
        }
        self.key.sign_hash(hash).await
    }

    fn address(&self) -> Address {
        Signer::address(&self.key)
    }

    fn chain_id(&self) -> Option<ChainId> {
        None
    }

    fn set_chain_id(&mut self, _: Option<ChainId>) {}
}

/// Decryption that can be held at the door once.
pub struct Gated {
    inner: Arc<MockFhe>,
    armed: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl Gated {
    pub fn new(inner: Arc<MockFhe>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Hold the next decryption request until `release` is notified.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst)
    }
}

#[async_trait]
impl DecryptionCapability for Gated {
    fn generate_keypair(&self) -> EphemeralKeypair {
        self.inner.generate_keypair()
    }

    fn eip712_domain(&self) -> Eip712Domain {
        self.inner.eip712_domain()
    }

    async fn user_decrypt(
        &self,
        pairs: &[HandleContractPair],
        auth: &DecryptionAuthorization,
    ) -> Result<HashMap<CiphertextHandle, U256>, CapabilityError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.user_decrypt(pairs, auth).await
    }
}

pub struct Harness {
    pub session: Session,
    pub ballot: Arc<MockBallot>,
    pub fhe: Arc<MockFhe>,
    pub gate: Arc<Gated>,
    pub wallet: Arc<Wallet>,
}

impl Harness {
    pub fn new(cfg: SessionConfig) -> Self {
        let wallet = Arc::new(Wallet::new());
        let fhe = Arc::new(MockFhe::new(31337, VERIFIER));
        let gate = Arc::new(Gated::new(fhe.clone()));
        let ballot = Arc::new(MockBallot::new(CONTRACT, wallet.address(), fhe.clone()));
        let session = Session::new(
            cfg,
            ballot.clone(),
            gate.clone(),
            fhe.clone(),
            wallet.clone(),
        );
        Self {
            session,
            ballot,
            fhe,
            gate,
            wallet,
        }
    }

    /// Register a proposal and return its id.
    pub async fn propose(&self, title: &str, categories: &[Category]) -> ProposalId {
        let p = NewProposal::builder()
            .title(title)
            .categories(categories.to_vec())
            .build();
        self.ballot.register_proposal(&p).await.unwrap();
        *self.ballot.list_proposal_ids().await.unwrap().last().unwrap()
    }

    /// Give a proposal `votes` in a category, stored under `[byte; 32]`.
    pub fn set_votes(&self, id: ProposalId, c: Category, byte: u8, votes: u64) -> CiphertextHandle {
        let h = handle(byte);
        self.fhe.store_at(h, U256::from(votes));
        self.ballot.set_ballot(id, c, h);
        h
    }

    /// Handles of every batch submitted for decryption.
    pub fn batches(&self) -> Vec<Vec<CiphertextHandle>> {
        self.fhe
            .requests()
            .into_iter()
            .map(|b| b.into_iter().map(|p| p.handle).collect())
            .collect()
    }
}

pub fn handle(byte: u8) -> CiphertextHandle {
    CiphertextHandle::new([byte; 32])
}
