use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::*;
use crate::tiebreak::elimination_order;

/// The scoring and elimination criterion of an elimination-round method.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum EliminationKind {
    /// First preferences; the lowest is eliminated; a majority of first preferences wins.
    InstantRunoff,
    /// Last preferences; the highest is eliminated; a majority of first preferences wins.
    Coombs,
    /// Borda scores over the remaining candidates; the lowest is eliminated.
    Baldwin,
    /// Borda scores over the remaining candidates; everyone strictly below the
    /// average is eliminated.
    Nanson,
}

/// Runs an elimination-round method with the given rules.
///
/// Each round tallies the ballots restricted to the candidates still running and
/// records the tally. Instant-runoff and Coombs stop as soon as a candidate holds
/// more than half of the first preferences of the round. Otherwise candidates are
/// eliminated until only one remains. Terminates in at most `candidates.len() - 1`
/// rounds.
pub fn run_elimination<B: RankedBallot>(
    candidates: &[Candidate],
    ballots: &[B],
    kind: EliminationKind,
    rules: &VoteRules,
) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    info!(
        "run_elimination: {:?} over {} ballots, {} candidates, rules: {:?}",
        kind,
        ballots.len(),
        candidates.len(),
        rules
    );

    let valid: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    // Cleaned once. Later rounds only have to skip the eliminated candidates.
    let cleaned = clean_all(ballots, &valid);

    let mut remaining: BTreeSet<String> = candidates.iter().map(|c| c.id.clone()).collect();
    let mut rounds: Vec<RoundRecord> = Vec::new();

    while remaining.len() > 1 {
        let round_id = (rounds.len() + 1) as u32;
        let tally = compute_tally(&cleaned, &remaining, kind);
        debug!("run_elimination: round {} tally: {:?}", round_id, tally);

        if matches!(kind, EliminationKind::InstantRunoff | EliminationKind::Coombs) {
            let first = if kind == EliminationKind::InstantRunoff {
                tally.clone()
            } else {
                compute_tally(&cleaned, &remaining, EliminationKind::InstantRunoff)
            };
            if let Some(cid) = majority_holder(&first) {
                debug!("run_elimination: round {}: {} holds a majority", round_id, cid);
                rounds.push(RoundRecord {
                    round: round_id,
                    tallies: tally,
                    eliminated: Vec::new(),
                });
                return finish(candidates, &cid, rounds);
            }
        }

        let eliminated = find_eliminated_candidates(&tally, kind, rules, round_id);
        assert!(
            !eliminated.is_empty() && eliminated.len() < remaining.len(),
            "Elimination must drop at least one candidate and keep one: {:?} -> {:?}",
            remaining,
            eliminated
        );
        debug!("run_elimination: round {} eliminated: {:?}", round_id, eliminated);
        for cid in eliminated.iter() {
            remaining.remove(cid);
        }
        rounds.push(RoundRecord {
            round: round_id,
            tallies: tally,
            eliminated,
        });
    }

    // Exactly one candidate is left.
    let last = remaining.iter().next().cloned().unwrap_or_default();
    finish(candidates, &last, rounds)
}

fn finish(candidates: &[Candidate], winner_id: &str, rounds: Vec<RoundRecord>) -> Results {
    let winner = crate::find_candidate(candidates, winner_id);
    info!(
        "run_elimination: winner {:?} after {} rounds",
        winner.as_ref().map(|c| &c.id),
        rounds.len()
    );
    Results { winner, rounds }
}

pub fn instant_runoff<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    instant_runoff_with_rules(candidates, ballots, &VoteRules::DEFAULT_RULES)
}

pub fn instant_runoff_with_rules<B: RankedBallot>(
    candidates: &[Candidate],
    ballots: &[B],
    rules: &VoteRules,
) -> Results {
    run_elimination(candidates, ballots, EliminationKind::InstantRunoff, rules)
}

pub fn coombs<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    run_elimination(
        candidates,
        ballots,
        EliminationKind::Coombs,
        &VoteRules::DEFAULT_RULES,
    )
}

pub fn baldwin<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    run_elimination(
        candidates,
        ballots,
        EliminationKind::Baldwin,
        &VoteRules::DEFAULT_RULES,
    )
}

pub fn nanson<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    run_elimination(
        candidates,
        ballots,
        EliminationKind::Nanson,
        &VoteRules::DEFAULT_RULES,
    )
}

/// Each ballot restricted to the registered candidates, with its count.
type Cleaned<'a> = Vec<(Vec<&'a str>, f64)>;

fn clean_all<'a, B: RankedBallot>(ballots: &'a [B], valid: &HashSet<&str>) -> Cleaned<'a> {
    ballots
        .iter()
        .filter(|b| b.count() > 0)
        .map(|b| (crate::clean_ranking(b.choices(), valid), b.count() as f64))
        .collect()
}

/// Tally over the remaining candidates only. Every remaining candidate has an
/// entry, even without any vote.
fn compute_tally(
    cleaned: &[(Vec<&str>, f64)],
    remaining: &BTreeSet<String>,
    kind: EliminationKind,
) -> BTreeMap<String, f64> {
    let mut tally: BTreeMap<String, f64> = remaining.iter().map(|cid| (cid.clone(), 0.0)).collect();
    let m = remaining.len();
    for (ballot, count) in cleaned.iter() {
        let mut still_running = ballot.iter().filter(|cid| remaining.contains(**cid));
        match kind {
            EliminationKind::InstantRunoff => {
                if let Some(cid) = still_running.next() {
                    bump(&mut tally, cid, *count);
                }
            }
            EliminationKind::Coombs => {
                if let Some(cid) = still_running.last() {
                    bump(&mut tally, cid, *count);
                }
            }
            EliminationKind::Baldwin | EliminationKind::Nanson => {
                for (rank, cid) in still_running.enumerate() {
                    bump(&mut tally, cid, (m - 1 - rank) as f64 * count);
                }
            }
        }
    }
    tally
}

fn bump(tally: &mut BTreeMap<String, f64>, cid: &str, by: f64) {
    if let Some(v) = tally.get_mut(cid) {
        *v += by;
    }
}

/// The candidate with strictly more than half of the tallied votes.
fn majority_holder(tally: &BTreeMap<String, f64>) -> Option<String> {
    let total: f64 = tally.values().sum();
    tally
        .iter()
        .find(|&(_, &v)| 2.0 * v > total)
        .map(|(cid, _)| cid.clone())
}

fn find_eliminated_candidates(
    tally: &BTreeMap<String, f64>,
    kind: EliminationKind,
    rules: &VoteRules,
    num_round: u32,
) -> Vec<String> {
    match kind {
        EliminationKind::InstantRunoff => {
            // Try to eliminate candidates in batch
            if rules.elimination_algorithm == EliminationAlgorithm::Batch {
                if let Some(v) = find_eliminated_candidates_batch(tally) {
                    return v;
                }
            }
            find_eliminated_single(tally, Extreme::Lowest, rules.tiebreak_mode, num_round)
        }
        EliminationKind::Coombs => {
            find_eliminated_single(tally, Extreme::Highest, rules.tiebreak_mode, num_round)
        }
        EliminationKind::Baldwin => {
            find_eliminated_single(tally, Extreme::Lowest, rules.tiebreak_mode, num_round)
        }
        EliminationKind::Nanson => {
            let average: f64 = tally.values().sum::<f64>() / tally.len() as f64;
            let below: Vec<String> = tally
                .iter()
                .filter(|&(_, &v)| v < average)
                .map(|(cid, _)| cid.clone())
                .collect();
            if below.is_empty() {
                // All the scores are equal.
                debug!("find_eliminated_candidates: nanson: nobody below average {}", average);
                find_eliminated_single(tally, Extreme::Lowest, rules.tiebreak_mode, num_round)
            } else {
                below
            }
        }
    }
}

fn find_eliminated_candidates_batch(tally: &BTreeMap<String, f64>) -> Option<Vec<String>> {
    // Sort the candidates in increasing tally, then by id.
    let mut sorted_tally: Vec<(&String, f64)> = tally.iter().map(|(cid, &vc)| (cid, vc)).collect();
    sorted_tally.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    // the vote count for this candidate and the cumulative count (excluding the current one)
    let mut sorted_tally_cum: Vec<(&String, f64, f64)> = Vec::new();
    let mut curr_count = 0.0;
    for &(cid, cur_vc) in sorted_tally.iter() {
        sorted_tally_cum.push((cid, cur_vc, curr_count));
        curr_count += cur_vc;
    }
    debug!(
        "find_eliminated_candidates_batch: sorted_tally_cum: {:?}",
        sorted_tally_cum
    );

    // Find the largest index for which the previous cumulative count is strictly lower than the current vote count.
    // Anything below will not be able to transfer higher.
    let large_gap_idx = sorted_tally_cum
        .iter()
        .enumerate()
        .filter(|(_, (_, cur_vc, previous_cum_count))| previous_cum_count < cur_vc)
        .last();

    // The idx == 0 element is not relevant because the previous cumulative count was zero.
    if let Some((idx, _)) = large_gap_idx {
        if idx > 0 {
            let res: Vec<String> = sorted_tally
                .iter()
                .map(|(cid, _)| (*cid).clone())
                .take(idx)
                .collect();
            debug!(
                "find_eliminated_candidates_batch: found a batch to eliminate: {:?}",
                res
            );
            return Some(res);
        }
    }
    debug!("find_eliminated_candidates_batch: no candidates to eliminate");
    None
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Extreme {
    Lowest,
    Highest,
}

// Elimination of a single candidate: the one at the given extreme of the tally.
fn find_eliminated_single(
    tally: &BTreeMap<String, f64>,
    extreme: Extreme,
    tiebreak: TieBreakMode,
    num_round: u32,
) -> Vec<String> {
    let target = match extreme {
        Extreme::Lowest => tally.values().cloned().fold(f64::INFINITY, f64::min),
        Extreme::Highest => tally.values().cloned().fold(f64::NEG_INFINITY, f64::max),
    };
    let tied: Vec<String> = tally
        .iter()
        .filter(|&(_, &v)| v == target)
        .map(|(cid, _)| cid.clone())
        .collect();
    debug!("find_eliminated_single: {:?} {}: {:?}", extreme, target, tied);
    if tied.len() == 1 {
        return tied;
    }
    elimination_order(&tied, tiebreak, num_round)
        .into_iter()
        .take(1)
        .collect()
}

/// Two-round runoff: if nobody holds a majority of first preferences, the two
/// leaders (ties to the smallest ids) meet in a head-to-head second round.
pub fn two_round_runoff<B: RankedBallot>(
    candidates: &[Candidate],
    ballots: &[B],
) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let valid: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    let cleaned = clean_all(ballots, &valid);
    let all: BTreeSet<String> = candidates.iter().map(|c| c.id.clone()).collect();
    let first = compute_tally(&cleaned, &all, EliminationKind::InstantRunoff);
    debug!("two_round_runoff: first round: {:?}", first);

    if let Some(cid) = majority_holder(&first).or_else(|| {
        // A lone candidate needs no runoff.
        if all.len() == 1 {
            all.iter().next().cloned()
        } else {
            None
        }
    }) {
        return finish(candidates, &cid, vec![crate::single_round(first)]);
    }

    let mut ordered: Vec<(&String, f64)> = first.iter().map(|(cid, &v)| (cid, v)).collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let finalists: BTreeSet<String> = ordered.iter().take(2).map(|(cid, _)| (*cid).clone()).collect();
    let eliminated: Vec<String> = ordered
        .iter()
        .skip(2)
        .map(|(cid, _)| (*cid).clone())
        .collect();

    let second = compute_tally(&cleaned, &finalists, EliminationKind::InstantRunoff);
    debug!("two_round_runoff: second round: {:?}", second);
    let winner_id = crate::argmax(&second).map(|s| s.to_string()).unwrap_or_default();
    let rounds = vec![
        RoundRecord {
            round: 1,
            tallies: first,
            eliminated,
        },
        RoundRecord {
            round: 2,
            tallies: second,
            eliminated: Vec::new(),
        },
    ];
    finish(candidates, &winner_id, rounds)
}

/// Bucklin: round `k` counts, for every candidate, the ballots listing it among
/// their first `k` choices. The first round in which a candidate holds more than
/// half of the votes tallied in that round decides. Without such a round, the
/// highest tally of the last round wins.
pub fn bucklin<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let valid: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    let cleaned = clean_all(ballots, &valid);

    let mut rounds: Vec<RoundRecord> = Vec::new();
    for k in 1..=candidates.len() {
        let mut tally: BTreeMap<String, f64> =
            candidates.iter().map(|c| (c.id.clone(), 0.0)).collect();
        for (ballot, count) in cleaned.iter() {
            for cid in ballot.iter().take(k) {
                bump(&mut tally, cid, *count);
            }
        }
        debug!("bucklin: round {}: {:?}", k, tally);
        let total: f64 = tally.values().sum();
        let leader: Option<String> = crate::argmax(&tally)
            .filter(|cid| 2.0 * tally[*cid] > total)
            .map(|cid| cid.to_string());
        rounds.push(RoundRecord {
            round: k as u32,
            tallies: tally,
            eliminated: Vec::new(),
        });
        if let Some(cid) = leader {
            return finish(candidates, &cid, rounds);
        }
    }
    let winner_id = rounds
        .last()
        .and_then(|r| crate::argmax(&r.tallies))
        .map(|s| s.to_string())
        .unwrap_or_default();
    finish(candidates, &winner_id, rounds)
}
