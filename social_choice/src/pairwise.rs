use log::debug;
use std::collections::{HashMap, HashSet};

use crate::config::*;

/// Pairwise win counts: `get(x, y)` is the number of ballots ranking `x`
/// strictly ahead of `y`.
///
/// A candidate missing from a ballot is ranked below every candidate present on
/// that ballot. Pairs where both candidates are missing are skipped, so
/// `get(x, y) + get(y, x)` never exceeds the number of ballots.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseMatrix {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    wins: Vec<Vec<u64>>,
}

impl PairwiseMatrix {
    /// The candidate ids, in the order in which they were registered.
    pub fn candidate_ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of ballots preferring `x` over `y`. Unknown ids count as zero.
    pub fn get(&self, x: &str, y: &str) -> u64 {
        match (self.index.get(x), self.index.get(y)) {
            (Some(&i), Some(&j)) => self.wins[i][j],
            _ => 0,
        }
    }

    /// Signed margin of `x` over `y`.
    pub fn margin(&self, x: &str, y: &str) -> i64 {
        self.get(x, y) as i64 - self.get(y, x) as i64
    }

    /// True if a strict majority of the ballots expressing a preference between
    /// `x` and `y` prefer `x`.
    pub fn beats(&self, x: &str, y: &str) -> bool {
        self.get(x, y) > self.get(y, x)
    }

    pub(crate) fn get_idx(&self, i: usize, j: usize) -> u64 {
        self.wins[i][j]
    }

    /// The candidate beating every other candidate head-to-head, if any.
    pub fn condorcet_winner(&self) -> Option<&str> {
        let n = self.ids.len();
        (0..n)
            .find(|&i| (0..n).all(|j| i == j || self.wins[i][j] > self.wins[j][i]))
            .map(|i| self.ids[i].as_str())
    }
}

/// Builds the pairwise matrix of the candidates over the ranked ballots.
///
/// Unknown ids on ballots are ignored, duplicates only count at their first
/// position. Runs in O(ballots × candidates²).
pub fn build_matrix<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> PairwiseMatrix {
    let ids: Vec<String> = crate::candidate_ids(candidates);
    let index: HashMap<String, usize> = ids
        .iter()
        .enumerate()
        .map(|(idx, cid)| (cid.clone(), idx))
        .collect();
    let valid: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
    let n = ids.len();
    let mut wins: Vec<Vec<u64>> = vec![vec![0; n]; n];

    for ballot in ballots.iter() {
        let count = ballot.count();
        // Position of each candidate on this ballot, None if not ranked.
        let mut positions: Vec<Option<usize>> = vec![None; n];
        for (pos, cid) in crate::clean_ranking(ballot.choices(), &valid).iter().enumerate() {
            positions[index[*cid]] = Some(pos);
        }
        for i in 0..n {
            for j in (i + 1)..n {
                match (positions[i], positions[j]) {
                    (Some(pi), Some(pj)) if pi < pj => wins[i][j] += count,
                    (Some(_), Some(_)) => wins[j][i] += count,
                    (Some(_), None) => wins[i][j] += count,
                    (None, Some(_)) => wins[j][i] += count,
                    (None, None) => {}
                }
            }
        }
    }
    debug!("build_matrix: {} ballots, wins: {:?}", ballots.len(), wins);
    PairwiseMatrix { ids, index, wins }
}

/// The candidate preferred to every other candidate by a pairwise majority.
pub fn condorcet_winner<B: RankedBallot>(
    candidates: &[Candidate],
    ballots: &[B],
) -> Option<Candidate> {
    if candidates.is_empty() || ballots.is_empty() {
        return None;
    }
    let m = build_matrix(candidates, ballots);
    m.condorcet_winner()
        .and_then(|cid| crate::find_candidate(candidates, cid))
}
