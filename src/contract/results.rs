use serde::Serialize;

use super::{Candidate, CandidateId, Category, CategoryId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStanding {
    pub candidate_id: CandidateId,
    pub name: String,
    pub votes: u64,
    /// Share of the category's votes, two decimals.
    pub percentage: f64,
    /// 1-based; tied candidates share a rank.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category_id: CategoryId,
    pub name: String,
    pub total_votes: u64,
    pub standings: Vec<CandidateStanding>,
}

impl CategorySummary {
    pub fn leader(&self) -> Option<&CandidateStanding> {
        self.standings.first().filter(|s| s.votes > 0)
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (votes as f64 * 10_000.0 / total as f64).round() / 100.0
}

/// Orders candidates by votes (desc, then id) and derives their shares.
/// The total is recomputed from the candidates rather than trusted.
pub fn summarize(category: &Category, candidates: &[Candidate]) -> CategorySummary {
    let total_votes: u64 = candidates.iter().map(|c| c.vote_count).sum();

    let mut ordered: Vec<&Candidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| b.vote_count.cmp(&a.vote_count).then(a.id.cmp(&b.id)));

    let mut standings: Vec<CandidateStanding> = Vec::with_capacity(ordered.len());
    for (index, candidate) in ordered.into_iter().enumerate() {
        let rank = match standings.last() {
            Some(prev) if prev.votes == candidate.vote_count => prev.rank,
            _ => index + 1,
        };
        standings.push(CandidateStanding {
            candidate_id: candidate.id,
            name: candidate.name.clone(),
            votes: candidate.vote_count,
            percentage: percentage(candidate.vote_count, total_votes),
            rank,
        });
    }

    CategorySummary {
        category_id: category.id,
        name: category.name.clone(),
        total_votes,
        standings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: CandidateId, name: &str, votes: u64) -> Candidate {
        Candidate {
            id,
            category_id: 1,
            name: name.to_string(),
            vote_count: votes,
        }
    }

    fn category() -> Category {
        Category {
            id: 1,
            name: "Basketball".to_string(),
            total_votes: 0,
        }
    }

    #[test]
    fn shares_sum_to_hundred_and_rank_by_votes() {
        let summary = summarize(&category(), &[candidate(2, "B", 20), candidate(1, "A", 30)]);

        assert_eq!(summary.total_votes, 50);
        assert_eq!(summary.standings[0].name, "A");
        assert_eq!(summary.standings[0].percentage, 60.0);
        assert_eq!(summary.standings[0].rank, 1);
        assert_eq!(summary.standings[1].name, "B");
        assert_eq!(summary.standings[1].percentage, 40.0);
        assert_eq!(summary.standings[1].rank, 2);
        assert_eq!(summary.leader().map(|s| s.candidate_id), Some(1));
    }

    #[test]
    fn uneven_shares_sum_within_rounding() {
        let summary = summarize(
            &category(),
            &[candidate(1, "A", 1), candidate(2, "B", 1), candidate(3, "C", 1)],
        );
        let sum: f64 = summary.standings.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() <= 0.01 * summary.standings.len() as f64);
        assert!(summary.standings.iter().all(|s| s.rank == 1));
        // Ties fall back to id order
        let ids: Vec<CandidateId> = summary.standings.iter().map(|s| s.candidate_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn empty_tally_has_no_leader() {
        let summary = summarize(&category(), &[candidate(1, "A", 0), candidate(2, "B", 0)]);
        assert_eq!(summary.total_votes, 0);
        assert!(summary.standings.iter().all(|s| s.percentage == 0.0));
        assert!(summary.leader().is_none());
    }

    #[test]
    fn competition_ranking_skips_after_ties() {
        let summary = summarize(
            &category(),
            &[candidate(1, "A", 5), candidate(2, "B", 5), candidate(3, "C", 2)],
        );
        let ranks: Vec<usize> = summary.standings.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3]);
    }
}
