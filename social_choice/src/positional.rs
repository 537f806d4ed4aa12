use log::{debug, info};
use std::collections::{BTreeMap, HashSet};

use crate::config::*;

/// Positional scoring: `weights[i]` points for the candidate ranked at position `i`
/// (0-indexed, after dropping unknown and repeated ids). Positions beyond the
/// weights score nothing.
///
/// Produces a single round with the final scores. The highest score wins, ties go
/// to the smallest id.
pub fn positional_scoring<B: RankedBallot>(
    candidates: &[Candidate],
    ballots: &[B],
    weights: &[f64],
) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let tallies = positional_tallies(candidates, ballots, weights);
    debug!("positional_scoring: weights {:?} tallies {:?}", weights, tallies);
    let winner = crate::argmax(&tallies).and_then(|cid| crate::find_candidate(candidates, cid));
    info!(
        "positional_scoring: {} ballots, winner {:?}",
        ballots.len(),
        winner.as_ref().map(|c| &c.id)
    );
    Results {
        winner,
        rounds: vec![crate::single_round(tallies)],
    }
}

pub(crate) fn positional_tallies<B: RankedBallot>(
    candidates: &[Candidate],
    ballots: &[B],
    weights: &[f64],
) -> BTreeMap<String, f64> {
    let mut tallies: BTreeMap<String, f64> = candidates.iter().map(|c| (c.id.clone(), 0.0)).collect();
    let valid: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    for ballot in ballots.iter() {
        let count = ballot.count() as f64;
        for (rank, cid) in crate::clean_ranking(ballot.choices(), &valid).iter().enumerate() {
            if let (Some(w), Some(t)) = (weights.get(rank), tallies.get_mut(*cid)) {
                *t += w * count;
            }
        }
    }
    tallies
}

pub fn plurality<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    positional_scoring(candidates, ballots, &[1.0])
}

/// Every ballot takes one point away from its last-ranked candidate.
pub fn anti_plurality<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    let m = candidates.len();
    let mut weights = vec![0.0; m.saturating_sub(1)];
    weights.push(-1.0);
    positional_scoring(candidates, ballots, &weights)
}

pub fn borda_count<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    positional_scoring(candidates, ballots, &borda_weights(candidates.len()))
}

pub(crate) fn borda_weights(m: usize) -> Vec<f64> {
    (0..m).rev().map(|w| w as f64).collect()
}

pub fn dowdall<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    let weights: Vec<f64> = (0..candidates.len()).map(|i| 1.0 / (i + 1) as f64).collect();
    positional_scoring(candidates, ballots, &weights)
}

pub fn veto<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    let m = candidates.len();
    let mut weights = vec![1.0; m.saturating_sub(1)];
    weights.push(0.0);
    positional_scoring(candidates, ballots, &weights)
}

pub fn five_three_one<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    positional_scoring(candidates, ballots, &[5.0, 3.0, 1.0])
}
