use std::collections::BTreeSet;
use std::fmt;

use alloy_primitives::{Address, U256};
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{Category, CiphertextHandle};

/// Contract-assigned proposal number.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProposalId(u64);

impl ProposalId {
    pub fn to_u256(self) -> U256 {
        U256::from(self.0)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ProposalId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ProposalId> for u64 {
    fn from(value: ProposalId) -> Self {
        value.0
    }
}

impl TryFrom<U256> for ProposalId {
    type Error = InvalidProposal;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| InvalidProposal::IdOutOfRange(value))
    }
}

/// A proposal as stored by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: ProposalId,
    pub author: Address,
    pub title: String,
    pub description_ref: String,
    pub file_ref: String,
    pub tags: Vec<String>,
    pub categories: BTreeSet<Category>,
}

impl ProposalRecord {
    pub fn is_member(&self, c: Category) -> bool {
        self.categories.contains(&c)
    }
}

/// A proposal about to be registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct NewProposal {
    #[builder(into)]
    pub title: String,

    /// Reference to the long description, e.g. an `ipfs://` URI.
    #[builder(into, default)]
    pub description_ref: String,

    /// Reference to supporting documents.
    #[builder(into, default)]
    pub file_ref: String,

    #[builder(default)]
    pub tags: Vec<String>,

    #[builder(default)]
    pub categories: Vec<Category>,
}

impl NewProposal {
    /// Split a comma separated tag list, dropping blanks.
    pub fn parse_tags(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn validate(&self) -> Result<(), InvalidProposal> {
        if self.title.trim().is_empty() {
            return Err(InvalidProposal::BlankTitle);
        }
        if self.categories.is_empty() {
            return Err(InvalidProposal::NoCategory);
        }
        Ok(())
    }

    /// Categories in selection order without repetitions.
    pub fn distinct_categories(&self) -> Vec<Category> {
        let mut seen = BTreeSet::new();
        self.categories
            .iter()
            .copied()
            .filter(|c| seen.insert(*c))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum InvalidProposal {
    #[error("proposal title must not be blank")]
    BlankTitle,

    #[error("proposal must select at least one category")]
    NoCategory,

    #[error("proposal id {0} does not fit into 64 bits")]
    IdOutOfRange(U256),
}

/// One category ballot of a proposal, as gathered for display and resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotEntry {
    pub id: ProposalId,
    pub handle: CiphertextHandle,
    pub author: Address,
    pub title: String,
}
