use alloy_primitives::U256;
use ghostvote_types::{BallotEntry, Category, ProposalId};

/// A displayed ballot and its decrypted vote count, if known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub entry: BallotEntry,
    pub votes: Option<U256>,
}

impl Standing {
    pub fn unresolved(entry: BallotEntry) -> Self {
        Self { entry, votes: None }
    }

    pub fn is_resolved(&self) -> bool {
        self.votes.is_some()
    }
}

/// The rows of a category as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    category: Category,
    rows: Vec<Standing>,
}

impl Standings {
    pub fn new(category: Category, rows: Vec<Standing>) -> Self {
        Self { category, rows }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Rows in collection order.
    pub fn rows(&self) -> &[Standing] {
        &self.rows
    }

    pub fn entries(&self) -> impl Iterator<Item = &BallotEntry> {
        self.rows.iter().map(|s| &s.entry)
    }

    pub fn get(&self, id: ProposalId) -> Option<&Standing> {
        self.rows.iter().find(|s| s.entry.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_resolved(&self) -> bool {
        self.rows.iter().all(Standing::is_resolved)
    }

    /// Rows by descending vote count. Unresolved rows count as zero and
    /// ties keep collection order.
    pub fn ranked(&self) -> Vec<&Standing> {
        let mut v = self.rows.iter().collect::<Vec<_>>();
        v.sort_by(|a, b| b.votes.unwrap_or_default().cmp(&a.votes.unwrap_or_default()));
        v
    }
}
