use std::sync::Arc;

use ghostvote_types::{BallotEntry, Category, ProposalId};
use tracing::{debug, trace};

use crate::ContractError;
use crate::traits::BallotContract;

/// Reads ciphertext handles of ballots from the contract.
#[derive(Clone)]
pub struct HandleCollector {
    contract: Arc<dyn BallotContract>,
}

impl HandleCollector {
    pub fn new(contract: Arc<dyn BallotContract>) -> Self {
        Self { contract }
    }

    pub fn contract(&self) -> &Arc<dyn BallotContract> {
        &self.contract
    }

    /// One entry per proposal competing in `category`, in listing order.
    ///
    /// Proposals without votes in the category carry the sentinel handle.
    pub async fn ballots(&self, category: Category) -> Result<Vec<BallotEntry>, ContractError> {
        let ids = self.contract.list_proposal_ids().await?;
        let mut entries = Vec::new();
        for id in ids {
            let record = self.contract.fetch_proposal(id).await?;
            if !record.is_member(category) {
                trace!(%id, %category, "proposal not in category");
                continue;
            }
            let handle = self.contract.ballot_handle_of(id, category).await?;
            entries.push(BallotEntry {
                id,
                handle,
                author: record.author,
                title: record.title,
            });
        }
        debug!(
            %category,
            entries = entries.len(),
            sentinel = entries.iter().filter(|e| e.handle.is_sentinel()).count(),
            "collected ballot handles"
        );
        Ok(entries)
    }

    /// The like counter of a single proposal.
    pub async fn likes(&self, id: ProposalId) -> Result<BallotEntry, ContractError> {
        let record = self.contract.fetch_proposal(id).await?;
        let handle = self.contract.likes_handle_of(id).await?;
        debug!(%id, %handle, "collected like handle");
        Ok(BallotEntry {
            id,
            handle,
            author: record.author,
            title: record.title,
        })
    }
}
