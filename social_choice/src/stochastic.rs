use log::{debug, info};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

use crate::config::*;

/// Random dictatorship: one voter is drawn uniformly at random and the first
/// registered choice of their ballot wins.
///
/// A ballot cast `count` times is `count` times as likely to be drawn. Only the
/// ballots naming at least one registered candidate take part in the draw;
/// without any, there is no winner. The randomness comes from the caller: the
/// same seeded generator and the same ballots always give the same outcome. The
/// recorded tally is the first-choice count of each candidate.
pub fn random_dictatorship<B: RankedBallot, R: Rng + ?Sized>(
    candidates: &[Candidate],
    ballots: &[B],
    rng: &mut R,
) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let valid: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    let first_choices: Vec<(&str, u64)> = ballots
        .iter()
        .filter(|b| b.count() > 0)
        .filter_map(|b| {
            crate::clean_ranking(b.choices(), &valid)
                .first()
                .map(|cid| (*cid, b.count()))
        })
        .collect();

    let mut tallies: BTreeMap<String, f64> = candidates.iter().map(|c| (c.id.clone(), 0.0)).collect();
    for (cid, count) in first_choices.iter() {
        if let Some(t) = tallies.get_mut(*cid) {
            *t += *count as f64;
        }
    }
    // Fails without any eligible ballot.
    let weights = first_choices.iter().map(|(_, count)| *count as f64);
    let drawn: Option<&str> = WeightedIndex::new(weights)
        .ok()
        .map(|dist| first_choices[dist.sample(rng)].0);
    debug!(
        "random_dictatorship: drew {:?} among {} eligible ballots",
        drawn,
        first_choices.len()
    );
    let winner = drawn.and_then(|cid| crate::find_candidate(candidates, cid));
    info!("random_dictatorship: winner {:?}", winner.as_ref().map(|c| &c.id));
    Results {
        winner,
        rounds: vec![crate::single_round(tallies)],
    }
}

/// Utilitarian choice: the highest average declared utility wins.
///
/// A candidate's average is taken over the voters who declared a utility for
/// it; candidates nobody rated are left out of the tally. Non-finite utilities
/// are ignored. Without any declared utility, there is no winner.
pub fn max_utility(candidates: &[Candidate], ballots: &[UtilityBallot]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let mut sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    let valid: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    for ballot in ballots.iter() {
        for (cid, u) in ballot.iter() {
            if valid.contains(cid.as_str()) && u.is_finite() {
                let e = sums.entry(cid.clone()).or_insert((0.0, 0));
                e.0 += u;
                e.1 += 1;
            }
        }
    }
    let averages: BTreeMap<String, f64> = sums
        .into_iter()
        .map(|(cid, (sum, n))| (cid, sum / n as f64))
        .collect();
    debug!("max_utility: averages {:?}", averages);
    let winner = crate::argmax(&averages).and_then(|cid| crate::find_candidate(candidates, cid));
    info!("max_utility: winner {:?}", winner.as_ref().map(|c| &c.id));
    Results {
        winner,
        rounds: vec![crate::single_round(averages)],
    }
}
