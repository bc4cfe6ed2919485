use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::results::{summarize, CategorySummary};
use super::{CandidateId, CategoryId, ContractError, TxReceipt, VotingContract};

/// Observable state of a submitted vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Waiting on the wallet prompt and the chain
    Pending,
    Confirmed(TxReceipt),
    /// Friendly text, see `friendly_message`
    Failed(String),
}

impl TxStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, TxStatus::Pending)
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            TxStatus::Confirmed(receipt) => Some(&receipt.tx_hash),
            _ => None,
        }
    }
}

/// Handle on a vote in flight.
pub struct VoteHandle {
    pub category_id: CategoryId,
    pub candidate_id: CandidateId,
    status: watch::Receiver<TxStatus>,
}

impl VoteHandle {
    pub fn status(&self) -> TxStatus {
        self.status.borrow().clone()
    }

    /// Receiver for UI code that reacts to every transition.
    pub fn subscribe(&self) -> watch::Receiver<TxStatus> {
        self.status.clone()
    }

    /// Resolves once the transaction is confirmed or failed.
    pub async fn wait(mut self) -> TxStatus {
        loop {
            let current = self.status.borrow_and_update().clone();
            if !current.is_pending() {
                return current;
            }
            if self.status.changed().await.is_err() {
                return self.status.borrow().clone();
            }
        }
    }
}

/// Voter-facing client over a `VotingContract`, bound to one wallet.
pub struct ElectionClient<C: VotingContract + 'static> {
    contract: Arc<C>,
    wallet: String,
    category_ids: Mutex<HashMap<String, CategoryId>>,
}

fn category_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl<C: VotingContract + 'static> ElectionClient<C> {
    pub fn new(contract: Arc<C>, wallet: impl Into<String>) -> Self {
        Self {
            contract,
            wallet: wallet.into(),
            category_ids: Mutex::new(HashMap::new()),
        }
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    fn cached_id(&self, key: &str) -> Option<CategoryId> {
        self.category_ids.lock().ok()?.get(key).copied()
    }

    /// Resolves a UKM name (case-insensitive) to its on-chain category id.
    pub async fn category_id(&self, name: &str) -> Result<CategoryId, ContractError> {
        let key = category_key(name);
        if let Some(id) = self.cached_id(&key) {
            return Ok(id);
        }

        let count = self.contract.category_count().await?;
        for id in 1..=count {
            let category = self.contract.get_category(id).await?;
            let found = category_key(&category.name);
            if let Ok(mut cache) = self.category_ids.lock() {
                cache.insert(found.clone(), id);
            }
            if found == key {
                return Ok(id);
            }
        }

        Err(ContractError::UnknownCategory(name.to_string()))
    }

    pub async fn results(&self, category_name: &str) -> Result<CategorySummary, ContractError> {
        let id = self.category_id(category_name).await?;
        let category = self.contract.get_category(id).await?;
        let candidates = self.contract.get_category_results(id).await?;
        Ok(summarize(&category, &candidates))
    }

    pub async fn has_voted(&self, category_name: &str) -> Result<bool, ContractError> {
        let id = self.category_id(category_name).await?;
        self.contract.has_user_voted(&self.wallet, id).await
    }

    /// Submits a vote. Resolution and already-voted failures are returned
    /// directly; failures after submission surface as `TxStatus::Failed`.
    pub async fn submit_vote(
        &self,
        category_name: &str,
        candidate_id: CandidateId,
    ) -> Result<VoteHandle, ContractError> {
        let category_id = self.category_id(category_name).await?;
        if self.contract.has_user_voted(&self.wallet, category_id).await? {
            return Err(ContractError::AlreadyVoted(category_id));
        }

        let (tx, rx) = watch::channel(TxStatus::Pending);
        let contract = Arc::clone(&self.contract);
        let wallet = self.wallet.clone();

        log::info!(
            "🗳️ Submitting vote: wallet {} category {} candidate {}",
            wallet,
            category_id,
            candidate_id
        );

        tokio::spawn(async move {
            let status = match contract.vote(&wallet, category_id, candidate_id).await {
                Ok(receipt) => {
                    log::info!("✅ Vote confirmed in tx {}", receipt.tx_hash);
                    TxStatus::Confirmed(receipt)
                }
                Err(e) => {
                    log::warn!("❌ Vote failed: {}", e);
                    TxStatus::Failed(e.user_message())
                }
            };
            tx.send_replace(status);
        });

        Ok(VoteHandle {
            category_id,
            candidate_id,
            status: rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::InMemoryLedger;

    const WALLET: &str = "0x00000000000000000000000000000000000000aa";

    fn ledger() -> Arc<InMemoryLedger> {
        let ledger = InMemoryLedger::new();
        for name in ["Badminton", "Basketball", "Binusian Gaming"] {
            let category = ledger.add_category(name).unwrap();
            ledger.add_candidate(category, "Edwin").unwrap();
            ledger.add_candidate(category, "Herbert").unwrap();
        }
        Arc::new(ledger)
    }

    #[tokio::test]
    async fn category_names_resolve_case_insensitively() {
        let client = ElectionClient::new(ledger(), WALLET);
        assert_eq!(client.category_id("binusian gaming").await.unwrap(), 3);
        assert_eq!(client.category_id(" BADMINTON ").await.unwrap(), 1);
        assert!(matches!(
            client.category_id("Sepakbola").await,
            Err(ContractError::UnknownCategory(_))
        ));
    }

    #[tokio::test]
    async fn vote_goes_pending_then_confirmed() {
        let ledger = ledger();
        let client = ElectionClient::new(Arc::clone(&ledger), WALLET);
        let basketball = client.category_id("Basketball").await.unwrap();
        let herbert = ledger.get_candidates_by_category(basketball).await.unwrap()[1].id;

        let handle = client.submit_vote("Basketball", herbert).await.unwrap();
        let status = handle.wait().await;

        assert!(status.tx_hash().is_some_and(|hash| hash.starts_with("0x")));
        assert!(client.has_voted("Basketball").await.unwrap());
        assert!(!client.has_voted("Badminton").await.unwrap());

        let summary = client.results("Basketball").await.unwrap();
        assert_eq!(summary.total_votes, 1);
        assert_eq!(summary.leader().map(|s| s.candidate_id), Some(herbert));
    }

    #[tokio::test]
    async fn second_vote_is_rejected_before_submission() {
        let ledger = ledger();
        let client = ElectionClient::new(Arc::clone(&ledger), WALLET);
        let candidates = ledger.get_candidates_by_category(1).await.unwrap();

        client.submit_vote("Badminton", candidates[0].id).await.unwrap().wait().await;

        let err = client
            .submit_vote("Badminton", candidates[1].id)
            .await
            .err()
            .unwrap();
        assert_eq!(err, ContractError::AlreadyVoted(1));

        let tallies: Vec<u64> = ledger
            .get_category_results(1)
            .await
            .unwrap()
            .iter()
            .map(|c| c.vote_count)
            .collect();
        assert_eq!(tallies, vec![1, 0]);
    }

    #[tokio::test]
    async fn wallet_rejection_surfaces_as_failed_status() {
        let ledger = ledger();
        let client = ElectionClient::new(Arc::clone(&ledger), WALLET);
        ledger
            .fail_next_vote(ContractError::Rejected(
                "MetaMask Tx Signature: User denied transaction signature.".to_string(),
            ))
            .unwrap();

        let handle = client.submit_vote("Badminton", 1).await.unwrap();
        assert_eq!(
            handle.wait().await,
            TxStatus::Failed("Transaction was cancelled in your wallet.".to_string())
        );
        assert!(!client.has_voted("Badminton").await.unwrap());
    }

    #[tokio::test]
    async fn tally_of_thirty_and_twenty_ranks_first_candidate() {
        let ledger = Arc::new(InMemoryLedger::new());
        let category = ledger.add_category("Musik").unwrap();
        let a = ledger.add_candidate(category, "A").unwrap();
        let b = ledger.add_candidate(category, "B").unwrap();
        for i in 0..50u32 {
            let wallet = format!("0x{:040x}", i);
            let choice = if i < 30 { a } else { b };
            ledger.vote(&wallet, category, choice).await.unwrap();
        }

        let client = ElectionClient::new(Arc::clone(&ledger), WALLET);
        let summary = client.results("musik").await.unwrap();
        let sum: f64 = summary.standings.iter().map(|s| s.percentage).sum();

        assert!((sum - 100.0).abs() < 0.02);
        assert_eq!(summary.standings[0].candidate_id, a);
        assert_eq!(summary.standings[0].percentage, 60.0);
        assert_eq!(summary.standings[1].candidate_id, b);
        assert!(summary.standings[0].rank < summary.standings[1].rank);
    }
}
