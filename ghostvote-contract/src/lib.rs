//! GhostVote contract bindings and a [`BallotContract`] over any alloy provider.

pub mod provider;

use std::collections::BTreeSet;

use alloy::{
    network::ReceiptResponse,
    primitives::{Address, B256, TxHash},
    providers::{PendingTransactionBuilder, Provider},
    sol,
};
use async_trait::async_trait;
use ghostvote_client::{BallotContract, ContractError};
use ghostvote_types::{
    Category, CiphertextHandle, EncryptedInput, NewProposal, ProposalId, ProposalRecord,
};
use tracing::{debug, warn};

sol! {
    #[sol(rpc)]
    interface IGhostVote {
        function listPieces() external view returns (uint256[] memory);

        function fetchPiece(uint256 pieceId) external view returns (
            uint256 id,
            address author,
            string memory title,
            string memory descHash,
            string memory fileHash,
            string[] memory tags,
            string[] memory groups,
            uint64 createdAt
        );

        function ballotBoxOf(uint256 pieceId, string calldata group) external view returns (bytes32);

        function likesOf(uint256 pieceId) external view returns (bytes32);

        function registerPiece(
            string calldata title,
            string calldata descHash,
            string calldata fileHash,
            string[] calldata tags,
            string[] calldata groups
        ) external returns (uint256);

        function vote(uint256 pieceId, string calldata group, bytes32 encOne, bytes calldata inputProof) external;

        function like(uint256 pieceId, bytes32 encOne, bytes calldata inputProof) external;
    }
}

/// The deployed GhostVote contract.
#[derive(Debug, Clone)]
pub struct GhostVote<P> {
    contract: IGhostVote::IGhostVoteInstance<P>,
}

impl<P: Provider> GhostVote<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            contract: IGhostVote::new(address, provider),
        }
    }

    pub fn provider(&self) -> &P {
        self.contract.provider()
    }
}

#[async_trait]
impl<P: Provider + 'static> BallotContract for GhostVote<P> {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn list_proposal_ids(&self) -> Result<Vec<ProposalId>, ContractError> {
        let ids = self
            .contract
            .listPieces()
            .call()
            .await
            .map_err(ContractError::call)?;
        ids.into_iter()
            .map(|id| ProposalId::try_from(id).map_err(|e| ContractError::Malformed(e.to_string())))
            .collect()
    }

    async fn fetch_proposal(&self, id: ProposalId) -> Result<ProposalRecord, ContractError> {
        let piece = self
            .contract
            .fetchPiece(id.to_u256())
            .call()
            .await
            .map_err(ContractError::call)?;
        record(piece)
    }

    async fn ballot_handle_of(
        &self,
        id: ProposalId,
        category: Category,
    ) -> Result<CiphertextHandle, ContractError> {
        let h = self
            .contract
            .ballotBoxOf(id.to_u256(), category.id().to_string())
            .call()
            .await
            .map_err(ContractError::call)?;
        Ok(CiphertextHandle::from(h))
    }

    async fn likes_handle_of(&self, id: ProposalId) -> Result<CiphertextHandle, ContractError> {
        let h = self
            .contract
            .likesOf(id.to_u256())
            .call()
            .await
            .map_err(ContractError::call)?;
        Ok(CiphertextHandle::from(h))
    }

    async fn register_proposal(&self, p: &NewProposal) -> Result<TxHash, ContractError> {
        let groups = p
            .distinct_categories()
            .into_iter()
            .map(|c| c.id().to_string())
            .collect();
        let pending = self
            .contract
            .registerPiece(
                p.title.clone(),
                p.description_ref.clone(),
                p.file_ref.clone(),
                p.tags.clone(),
                groups,
            )
            .send()
            .await
            .map_err(ContractError::call)?;
        confirm(pending, "registerPiece").await
    }

    async fn vote(
        &self,
        id: ProposalId,
        category: Category,
        input: &EncryptedInput,
    ) -> Result<TxHash, ContractError> {
        let pending = self
            .contract
            .vote(
                id.to_u256(),
                category.id().to_string(),
                B256::from(input.handle),
                input.proof.clone(),
            )
            .send()
            .await
            .map_err(ContractError::call)?;
        confirm(pending, "vote").await
    }

    async fn like(&self, id: ProposalId, input: &EncryptedInput) -> Result<TxHash, ContractError> {
        let pending = self
            .contract
            .like(id.to_u256(), B256::from(input.handle), input.proof.clone())
            .send()
            .await
            .map_err(ContractError::call)?;
        confirm(pending, "like").await
    }
}

/// Wait for the receipt and check the transaction succeeded.
async fn confirm(
    pending: PendingTransactionBuilder<alloy::network::Ethereum>,
    call: &'static str,
) -> Result<TxHash, ContractError> {
    let tx = *pending.tx_hash();
    debug!(%tx, %call, "transaction sent");
    let receipt = pending.get_receipt().await.map_err(ContractError::call)?;
    if !receipt.status() {
        warn!(%tx, %call, "transaction reverted");
        return Err(ContractError::Reverted(receipt.transaction_hash()));
    }
    Ok(receipt.transaction_hash())
}

fn record(piece: IGhostVote::fetchPieceReturn) -> Result<ProposalRecord, ContractError> {
    let id = ProposalId::try_from(piece.id).map_err(|e| ContractError::Malformed(e.to_string()))?;
    let mut categories = BTreeSet::new();
    for g in &piece.groups {
        match g.parse::<Category>() {
            Ok(c) => {
                categories.insert(c);
            }
            Err(err) => warn!(%id, %err, "ignoring unknown category"),
        }
    }
    Ok(ProposalRecord {
        id,
        author: piece.author,
        title: piece.title,
        description_ref: piece.descHash,
        file_ref: piece.fileHash,
        tags: piece.tags,
        categories,
    })
}
