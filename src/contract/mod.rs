//! Client-side model of the on-chain UKM voting contract.
//!
//! Votes are cast and tallied by the deployed contract; this module only
//! mirrors its function surface (`VotingContract`), derives display data
//! from it, and tracks submitted transactions. Nothing here is persisted
//! by the auth service.

pub mod client;
pub mod ledger;
pub mod results;

pub use client::{ElectionClient, TxStatus, VoteHandle};
pub use ledger::InMemoryLedger;
pub use results::{summarize, CandidateStanding, CategorySummary};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type CategoryId = u64;
pub type CandidateId = u64;

/// On-chain grouping of candidates, one per UKM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub total_votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub category_id: CategoryId,
    pub name: String,
    pub vote_count: u64,
}

/// Receipt of a mined vote transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("candidate {candidate} is not in category {category}")]
    UnknownCandidate {
        category: CategoryId,
        candidate: CandidateId,
    },

    #[error("candidate {0} not found")]
    CandidateNotFound(CandidateId),

    #[error("already voted in category {0}")]
    AlreadyVoted(CategoryId),

    /// Raw error text reported by the wallet or node.
    #[error("{0}")]
    Rejected(String),

    #[error("contract unreachable: {0}")]
    Unreachable(String),
}

impl ContractError {
    /// Text suitable for showing to a voter.
    pub fn user_message(&self) -> String {
        friendly_message(&self.to_string())
    }
}

/// Function surface of the deployed voting contract.
#[async_trait]
pub trait VotingContract: Send + Sync {
    async fn category_count(&self) -> Result<u64, ContractError>;
    async fn get_category(&self, category_id: CategoryId) -> Result<Category, ContractError>;
    async fn get_candidate(&self, candidate_id: CandidateId) -> Result<Candidate, ContractError>;
    async fn get_candidates_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Candidate>, ContractError>;
    /// Candidates of the category with their current tallies.
    async fn get_category_results(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Candidate>, ContractError>;
    async fn has_user_voted(&self, wallet: &str, category_id: CategoryId)
        -> Result<bool, ContractError>;
    async fn get_user_vote(
        &self,
        wallet: &str,
        category_id: CategoryId,
    ) -> Result<Option<CandidateId>, ContractError>;
    /// Single-call transaction; rejected votes never change the tally.
    async fn vote(
        &self,
        wallet: &str,
        category_id: CategoryId,
        candidate_id: CandidateId,
    ) -> Result<TxReceipt, ContractError>;
}

/// Maps known wallet/contract error strings to friendlier text.
pub fn friendly_message(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.contains("user rejected") || lower.contains("user denied") {
        "Transaction was cancelled in your wallet.".to_string()
    } else if lower.contains("insufficient funds") {
        "Your wallet does not have enough funds to pay the transaction fee.".to_string()
    } else if lower.contains("already voted") {
        "You have already voted in this category.".to_string()
    } else {
        raw.to_string()
    }
}
