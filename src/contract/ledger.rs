use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{
    Candidate, CandidateId, Category, CategoryId, ContractError, TxReceipt, VotingContract,
};

#[derive(Default)]
struct LedgerState {
    categories: Vec<Category>,
    candidates: Vec<Candidate>,
    // (lower-cased wallet, category) -> candidate
    votes: HashMap<(String, CategoryId), CandidateId>,
    block_number: u64,
    pending_failure: Option<ContractError>,
}

/// Local stand-in for the deployed contract, applying the same rules.
/// Category and candidate ids start at 1, as on-chain.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LedgerState>, ContractError> {
        self.state
            .lock()
            .map_err(|_| ContractError::Unreachable("ledger lock poisoned".to_string()))
    }

    pub fn add_category(&self, name: &str) -> Result<CategoryId, ContractError> {
        let mut state = self.lock()?;
        let id = state.categories.len() as CategoryId + 1;
        state.categories.push(Category {
            id,
            name: name.to_string(),
            total_votes: 0,
        });
        Ok(id)
    }

    pub fn add_candidate(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> Result<CandidateId, ContractError> {
        let mut state = self.lock()?;
        if !state.categories.iter().any(|c| c.id == category_id) {
            return Err(ContractError::UnknownCategory(category_id.to_string()));
        }
        let id = state.candidates.len() as CandidateId + 1;
        state.candidates.push(Candidate {
            id,
            category_id,
            name: name.to_string(),
            vote_count: 0,
        });
        Ok(id)
    }

    /// Makes the next `vote` call fail with `error`, as a wallet would.
    pub fn fail_next_vote(&self, error: ContractError) -> Result<(), ContractError> {
        self.lock()?.pending_failure = Some(error);
        Ok(())
    }
}

fn find_category(state: &LedgerState, id: CategoryId) -> Result<&Category, ContractError> {
    state
        .categories
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| ContractError::UnknownCategory(id.to_string()))
}

fn tx_hash() -> String {
    format!("0x{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[async_trait]
impl VotingContract for InMemoryLedger {
    async fn category_count(&self) -> Result<u64, ContractError> {
        Ok(self.lock()?.categories.len() as u64)
    }

    async fn get_category(&self, category_id: CategoryId) -> Result<Category, ContractError> {
        let state = self.lock()?;
        find_category(&state, category_id).cloned()
    }

    async fn get_candidate(&self, candidate_id: CandidateId) -> Result<Candidate, ContractError> {
        let state = self.lock()?;
        state
            .candidates
            .iter()
            .find(|c| c.id == candidate_id)
            .cloned()
            .ok_or(ContractError::CandidateNotFound(candidate_id))
    }

    async fn get_candidates_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Candidate>, ContractError> {
        let state = self.lock()?;
        find_category(&state, category_id)?;
        Ok(state
            .candidates
            .iter()
            .filter(|c| c.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn get_category_results(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Candidate>, ContractError> {
        self.get_candidates_by_category(category_id).await
    }

    async fn has_user_voted(
        &self,
        wallet: &str,
        category_id: CategoryId,
    ) -> Result<bool, ContractError> {
        Ok(self.get_user_vote(wallet, category_id).await?.is_some())
    }

    async fn get_user_vote(
        &self,
        wallet: &str,
        category_id: CategoryId,
    ) -> Result<Option<CandidateId>, ContractError> {
        let state = self.lock()?;
        find_category(&state, category_id)?;
        Ok(state
            .votes
            .get(&(wallet.to_lowercase(), category_id))
            .copied())
    }

    async fn vote(
        &self,
        wallet: &str,
        category_id: CategoryId,
        candidate_id: CandidateId,
    ) -> Result<TxReceipt, ContractError> {
        let mut state = self.lock()?;

        if let Some(error) = state.pending_failure.take() {
            return Err(error);
        }

        find_category(&state, category_id)?;
        let key = (wallet.to_lowercase(), category_id);
        if state.votes.contains_key(&key) {
            return Err(ContractError::AlreadyVoted(category_id));
        }

        let candidate = state
            .candidates
            .iter_mut()
            .find(|c| c.id == candidate_id && c.category_id == category_id)
            .ok_or(ContractError::UnknownCandidate {
                category: category_id,
                candidate: candidate_id,
            })?;
        candidate.vote_count += 1;

        if let Some(category) = state.categories.iter_mut().find(|c| c.id == category_id) {
            category.total_votes += 1;
        }
        state.votes.insert(key, candidate_id);
        state.block_number += 1;

        Ok(TxReceipt {
            tx_hash: tx_hash(),
            block_number: state.block_number,
        })
    }
}
