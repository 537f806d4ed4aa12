use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::config::*;
use crate::pairwise::{build_matrix, PairwiseMatrix};

/// Above this many candidates, `kemeny_young` refuses to enumerate the orderings.
pub const KEMENY_MAX_CANDIDATES: usize = 8;

fn decide(
    method: &str,
    candidates: &[Candidate],
    tallies: BTreeMap<String, f64>,
    winner_id: Option<&str>,
) -> Results {
    let winner = winner_id.and_then(|cid| crate::find_candidate(candidates, cid));
    info!(
        "{}: winner {:?}, tallies {:?}",
        method,
        winner.as_ref().map(|c| &c.id),
        tallies
    );
    Results {
        winner,
        rounds: vec![crate::single_round(tallies)],
    }
}

fn per_candidate<F>(m: &PairwiseMatrix, f: F) -> BTreeMap<String, f64>
where
    F: Fn(usize) -> f64,
{
    m.candidate_ids()
        .iter()
        .enumerate()
        .map(|(i, cid)| (cid.clone(), f(i)))
        .collect()
}

/// Minimax: the candidate whose worst pairwise margin of defeat is the smallest.
///
/// The recorded tally is that worst margin (negative when the candidate beats
/// everybody).
pub fn minimax<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let m = build_matrix(candidates, ballots);
    let n = m.len();
    let worst = per_candidate(&m, |x| {
        (0..n)
            .filter(|&y| y != x)
            .map(|y| m.get_idx(y, x) as i64 - m.get_idx(x, y) as i64)
            .max()
            .unwrap_or(0) as f64
    });
    let winner_id = crate::argmin(&worst).map(|s| s.to_string());
    decide("minimax", candidates, worst, winner_id.as_deref())
}

/// Copeland: +1 for every pairwise victory, -1 for every defeat.
pub fn copeland<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let m = build_matrix(candidates, ballots);
    let n = m.len();
    let score = per_candidate(&m, |x| {
        (0..n)
            .filter(|&y| y != x)
            .map(|y| match m.get_idx(x, y).cmp(&m.get_idx(y, x)) {
                std::cmp::Ordering::Greater => 1.0,
                std::cmp::Ordering::Less => -1.0,
                std::cmp::Ordering::Equal => 0.0,
            })
            .sum()
    });
    let winner_id = crate::argmax(&score).map(|s| s.to_string());
    decide("copeland", candidates, score, winner_id.as_deref())
}

/// Black's rule: the Condorcet winner if there is one, Borda count otherwise.
pub fn black_rule<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let m = build_matrix(candidates, ballots);
    match m.condorcet_winner() {
        Some(cid) => {
            let n = m.len();
            let wins = per_candidate(&m, |x| {
                (0..n)
                    .filter(|&y| y != x && m.get_idx(x, y) > m.get_idx(y, x))
                    .count() as f64
            });
            let cid = cid.to_string();
            decide("black_rule", candidates, wins, Some(cid.as_str()))
        }
        None => {
            debug!("black_rule: no condorcet winner, falling back to borda");
            crate::positional::borda_count(candidates, ballots)
        }
    }
}

/// The Smith set: the smallest non-empty set of candidates that each beat every
/// candidate outside of it. Returned in registration order.
pub fn smith_set<B: RankedBallot>(
    candidates: &[Candidate],
    ballots: &[B],
) -> Vec<Candidate> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let m = build_matrix(candidates, ballots);
    let n = m.len();
    // reach[x][y]: x reaches y through a chain of pairwise wins or ties.
    let mut reach: Vec<Vec<bool>> = (0..n)
        .map(|x| (0..n).map(|y| x == y || m.get_idx(x, y) >= m.get_idx(y, x)).collect())
        .collect();
    for k in 0..n {
        for x in 0..n {
            if reach[x][k] {
                for y in 0..n {
                    if reach[k][y] {
                        reach[x][y] = true;
                    }
                }
            }
        }
    }
    let res: Vec<Candidate> = candidates
        .iter()
        .enumerate()
        .filter(|(x, _)| reach[*x].iter().all(|r| *r))
        .map(|(_, c)| c.clone())
        .collect();
    debug!(
        "smith_set: {:?}",
        res.iter().map(|c| c.id.as_str()).collect::<Vec<_>>()
    );
    res
}

/// Instant-runoff restricted to the Smith set, over the original ballots.
pub fn smith_irv<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    smith_irv_with_rules(candidates, ballots, &VoteRules::DEFAULT_RULES)
}

pub fn smith_irv_with_rules<B: RankedBallot>(
    candidates: &[Candidate],
    ballots: &[B],
    rules: &VoteRules,
) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let smith = smith_set(candidates, ballots);
    info!("smith_irv: {} of {} candidates in the smith set", smith.len(), candidates.len());
    crate::elimination::instant_runoff_with_rules(&smith, ballots, rules)
}

/// Ranked pairs (Tideman).
///
/// Pairs are locked by decreasing margin; equal margins are taken by winner id,
/// then loser id. A pair is skipped when its loser already reaches its winner
/// through locked edges. Tied pairs are never locked. The tally is the number of
/// locked edges pointing at each candidate; the winner is the source of the
/// graph.
pub fn ranked_pairs<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let m = build_matrix(candidates, ballots);
    let ids = m.candidate_ids();
    let n = m.len();

    let mut pairs: Vec<(i64, usize, usize)> = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let margin = m.get_idx(i, j) as i64 - m.get_idx(j, i) as i64;
            if i != j && margin > 0 {
                pairs.push((margin, i, j));
            }
        }
    }
    pairs.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| ids[a.1].cmp(&ids[b.1]))
            .then_with(|| ids[a.2].cmp(&ids[b.2]))
    });

    let mut locked: Vec<Vec<bool>> = vec![vec![false; n]; n];
    for (margin, w, l) in pairs {
        if reaches(&locked, l, w) {
            debug!(
                "ranked_pairs: skipping {} > {} ({}): creates a cycle",
                ids[w], ids[l], margin
            );
        } else {
            debug!("ranked_pairs: locking {} > {} ({})", ids[w], ids[l], margin);
            locked[w][l] = true;
        }
    }

    let in_degree = per_candidate(&m, |x| (0..n).filter(|&y| locked[y][x]).count() as f64);
    let winner_id = crate::argmin(&in_degree).map(|s| s.to_string());
    decide("ranked_pairs", candidates, in_degree, winner_id.as_deref())
}

// Depth-first search over the locked edges.
fn reaches(locked: &[Vec<bool>], from: usize, to: usize) -> bool {
    let mut visited = vec![false; locked.len()];
    let mut stack = vec![from];
    while let Some(x) = stack.pop() {
        if x == to {
            return true;
        }
        if visited[x] {
            continue;
        }
        visited[x] = true;
        for (y, &edge) in locked[x].iter().enumerate() {
            if edge && !visited[y] {
                stack.push(y);
            }
        }
    }
    false
}

/// Schulze method. The strongest beatpaths are computed with a Floyd-Warshall
/// style relaxation; the winner is the smallest id whose beatpath to every
/// other candidate is at least as strong as the path back. The tally counts
/// the beatpath victories of each candidate.
pub fn schulze_method<B: RankedBallot>(
    candidates: &[Candidate],
    ballots: &[B],
) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let m = build_matrix(candidates, ballots);
    let n = m.len();
    let mut p: Vec<Vec<u64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i != j && m.get_idx(i, j) > m.get_idx(j, i) {
                        m.get_idx(i, j)
                    } else {
                        0
                    }
                })
                .collect()
        })
        .collect();
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            for k in 0..n {
                if k != i && k != j {
                    p[j][k] = p[j][k].max(p[j][i].min(p[i][k]));
                }
            }
        }
    }
    debug!("schulze_method: beatpaths: {:?}", p);

    let beatpath_wins = per_candidate(&m, |x| (0..n).filter(|&y| p[x][y] > p[y][x]).count() as f64);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| m.candidate_ids()[a].cmp(&m.candidate_ids()[b]));
    let winner_id = order
        .into_iter()
        .find(|&x| (0..n).all(|y| p[x][y] >= p[y][x]))
        .map(|x| m.candidate_ids()[x].clone())
        .or_else(|| crate::argmax(&beatpath_wins).map(|s| s.to_string()));
    decide("schulze_method", candidates, beatpath_wins, winner_id.as_deref())
}

/// Kemeny-Young: the head of the ordering that agrees with the most pairwise
/// preferences.
///
/// Every ordering of the candidates is scored, which takes factorial time.
/// With more than [`KEMENY_MAX_CANDIDATES`] candidates the search is refused:
/// no winner and no rounds. Among equally good orderings, the first in
/// lexicographic order of ids is kept. The tally of a candidate is the best
/// score of the orderings it heads.
pub fn kemeny_young<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    if candidates.len() > KEMENY_MAX_CANDIDATES {
        warn!(
            "kemeny_young: {} candidates exceed the limit of {}, not resolving",
            candidates.len(),
            KEMENY_MAX_CANDIDATES
        );
        return Results::empty();
    }
    let m = build_matrix(candidates, ballots);
    let ids = m.candidate_ids();
    let mut sorted_idx: Vec<usize> = (0..m.len()).collect();
    sorted_idx.sort_by(|&a, &b| ids[a].cmp(&ids[b]));

    let mut best: Option<(u64, Vec<usize>)> = None;
    let mut best_by_head: BTreeMap<String, f64> = BTreeMap::new();
    for perm in sorted_idx.iter().cloned().permutations(sorted_idx.len()) {
        let score: u64 = perm
            .iter()
            .enumerate()
            .flat_map(|(pos, &i)| perm[pos + 1..].iter().map(move |&j| (i, j)))
            .map(|(i, j)| m.get_idx(i, j))
            .sum();
        let head = best_by_head.entry(ids[perm[0]].clone()).or_insert(0.0);
        *head = head.max(score as f64);
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, perm));
        }
    }
    debug!("kemeny_young: best ordering {:?}", best);
    let winner_id = best.map(|(_, perm)| ids[perm[0]].clone());
    decide("kemeny_young", candidates, best_by_head, winner_id.as_deref())
}

/// Approximation of the Dodgson score: the sum of the pairwise margins by which
/// a candidate is beaten. The exact Dodgson distance (adjacent swaps needed to
/// make a candidate the Condorcet winner) is NP-hard and is not computed.
/// Lowest wins.
pub fn dodgson<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    deficit_rule("dodgson", candidates, ballots)
}

/// Approximation of the Young score, using the same deficit as [`dodgson`].
pub fn young<B: RankedBallot>(candidates: &[Candidate], ballots: &[B]) -> Results {
    deficit_rule("young", candidates, ballots)
}

fn deficit_rule<B: RankedBallot>(
    method: &str,
    candidates: &[Candidate],
    ballots: &[B],
) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let m = build_matrix(candidates, ballots);
    let n = m.len();
    let deficits = per_candidate(&m, |x| {
        (0..n)
            .filter(|&y| y != x)
            .map(|y| (m.get_idx(y, x) as i64 - m.get_idx(x, y) as i64).max(0))
            .sum::<i64>() as f64
    });
    let winner_id = crate::argmin(&deficits).map(|s| s.to_string());
    decide(method, candidates, deficits, winner_id.as_deref())
}
