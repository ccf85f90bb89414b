//! Seams to the external collaborators: the ballot contract and the
//! homomorphic encryption runtime.

use std::collections::HashMap;

use alloy_primitives::{Address, TxHash, U256};
use alloy_sol_types::Eip712Domain;
use async_trait::async_trait;
use ghostvote_types::{
    Category, CiphertextHandle, DecryptionAuthorization, EncryptedInput, EphemeralKeypair,
    NewProposal, ProposalId, ProposalRecord,
};

use crate::{CapabilityError, ContractError};

/// A ciphertext handle together with the contract that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleContractPair {
    pub handle: CiphertextHandle,
    pub contract: Address,
}

/// Read and write access to the ballot contract.
#[async_trait]
pub trait BallotContract: Send + Sync {
    fn address(&self) -> Address;

    /// All proposal ids in creation order.
    async fn list_proposal_ids(&self) -> Result<Vec<ProposalId>, ContractError>;

    async fn fetch_proposal(&self, id: ProposalId) -> Result<ProposalRecord, ContractError>;

    /// The encrypted vote counter of a proposal in a category.
    ///
    /// A proposal without votes in the category yields the sentinel.
    async fn ballot_handle_of(
        &self,
        id: ProposalId,
        category: Category,
    ) -> Result<CiphertextHandle, ContractError>;

    /// The encrypted like counter of a proposal.
    async fn likes_handle_of(&self, id: ProposalId) -> Result<CiphertextHandle, ContractError>;

    /// Register a proposal and wait for the transaction to be confirmed.
    async fn register_proposal(&self, proposal: &NewProposal) -> Result<TxHash, ContractError>;

    async fn vote(
        &self,
        id: ProposalId,
        category: Category,
        input: &EncryptedInput,
    ) -> Result<TxHash, ContractError>;

    async fn like(&self, id: ProposalId, input: &EncryptedInput) -> Result<TxHash, ContractError>;
}

/// User decryption as offered by the encryption runtime.
#[async_trait]
pub trait DecryptionCapability: Send + Sync {
    fn generate_keypair(&self) -> EphemeralKeypair;

    /// The EIP-712 domain authorization requests are signed under.
    fn eip712_domain(&self) -> Eip712Domain;

    /// Decrypt all `pairs` in one round trip.
    async fn user_decrypt(
        &self,
        pairs: &[HandleContractPair],
        auth: &DecryptionAuthorization,
    ) -> Result<HashMap<CiphertextHandle, U256>, CapabilityError>;
}

/// Input encryption as offered by the encryption runtime.
#[async_trait]
pub trait EncryptionCapability: Send + Sync {
    /// Encrypt `value` for use by `user` in a call to `contract`.
    async fn encrypt_u32(
        &self,
        contract: Address,
        user: Address,
        value: u32,
    ) -> Result<EncryptedInput, CapabilityError>;
}
