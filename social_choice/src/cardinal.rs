use log::{debug, info};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::config::*;

fn zero_tallies(candidates: &[Candidate]) -> BTreeMap<String, f64> {
    candidates.iter().map(|c| (c.id.clone(), 0.0)).collect()
}

fn finish(
    method: &str,
    candidates: &[Candidate],
    winner_id: Option<&str>,
    rounds: Vec<RoundRecord>,
) -> Results {
    let winner = winner_id.and_then(|cid| crate::find_candidate(candidates, cid));
    info!(
        "{}: winner {:?} after {} rounds",
        method,
        winner.as_ref().map(|c| &c.id),
        rounds.len()
    );
    Results { winner, rounds }
}

/// Ids of the tally sorted by decreasing tally, then increasing id.
fn ranked_by_tally(tallies: &BTreeMap<String, f64>) -> Vec<String> {
    let mut v: Vec<(&String, f64)> = tallies.iter().map(|(cid, &t)| (cid, t)).collect();
    v.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    v.into_iter().map(|(cid, _)| cid.clone()).collect()
}

// **** Approval and score ****

pub fn approval(candidates: &[Candidate], ballots: &[ApprovalBallot]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let mut tallies = zero_tallies(candidates);
    for ballot in ballots.iter() {
        for cid in ballot.iter() {
            if let Some(t) = tallies.get_mut(cid) {
                *t += 1.0;
            }
        }
    }
    let winner_id = crate::argmax(&tallies).map(|s| s.to_string());
    finish("approval", candidates, winner_id.as_deref(), vec![crate::single_round(tallies)])
}

/// Sum of the declared scores. Non-finite scores are ignored.
pub fn score(candidates: &[Candidate], ballots: &[ScoreBallot]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let tallies = score_totals(candidates, ballots);
    let winner_id = crate::argmax(&tallies).map(|s| s.to_string());
    finish("score", candidates, winner_id.as_deref(), vec![crate::single_round(tallies)])
}

fn score_totals(candidates: &[Candidate], ballots: &[ScoreBallot]) -> BTreeMap<String, f64> {
    let mut tallies = zero_tallies(candidates);
    for ballot in ballots.iter() {
        for (cid, s) in ballot.iter() {
            if let (Some(t), true) = (tallies.get_mut(cid), s.is_finite()) {
                *t += s;
            }
        }
    }
    tallies
}

fn declared_score(ballot: &ScoreBallot, cid: &str) -> f64 {
    ballot.get(cid).cloned().filter(|s| s.is_finite()).unwrap_or(0.0)
}

/// STAR voting (score then automatic runoff).
///
/// The first round sums the scores; the two best totals go to the runoff (ties
/// to the smallest id). In the runoff, each ballot supports the finalist it
/// scored higher; an undeclared score counts as 0 and equal scores support
/// nobody. A tied runoff goes to the finalist with the higher score total, then
/// to the smallest id.
pub fn star(candidates: &[Candidate], ballots: &[ScoreBallot]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let totals = score_totals(candidates, ballots);
    let order = ranked_by_tally(&totals);
    debug!("star: score round {:?}", totals);
    if order.len() == 1 {
        let cid = order[0].clone();
        return finish(
            "star",
            candidates,
            Some(cid.as_str()),
            vec![crate::single_round(totals)],
        );
    }

    let (first, second) = (order[0].clone(), order[1].clone());
    let mut runoff: BTreeMap<String, f64> = BTreeMap::new();
    runoff.insert(first.clone(), 0.0);
    runoff.insert(second.clone(), 0.0);
    for ballot in ballots.iter() {
        let (a, b) = (declared_score(ballot, &first), declared_score(ballot, &second));
        let preferred = match a.total_cmp(&b) {
            Ordering::Greater => Some(&first),
            Ordering::Less => Some(&second),
            Ordering::Equal => None,
        };
        if let Some(t) = preferred.and_then(|cid| runoff.get_mut(cid)) {
            *t += 1.0;
        }
    }
    debug!("star: runoff {:?}", runoff);
    // `first` already wins ties on the score total and on the id.
    let winner_id = if runoff[&second] > runoff[&first] {
        second
    } else {
        first
    };
    let rounds = vec![
        RoundRecord {
            round: 1,
            tallies: totals,
            eliminated: order[2..].to_vec(),
        },
        RoundRecord {
            round: 2,
            tallies: runoff,
            eliminated: Vec::new(),
        },
    ];
    finish("star", candidates, Some(winner_id.as_str()), rounds)
}

// **** Majority judgment ****

// Common grade labels, best first. Labels sharing a level are synonyms.
const GRADE_LEVELS: [(&str, u32); 12] = [
    ("excellent", 0),
    ("very good", 1),
    ("good", 2),
    ("fair", 3),
    ("acceptable", 3),
    ("passable", 3),
    ("poor", 4),
    ("insufficient", 5),
    ("bad", 6),
    ("reject", 6),
    ("to reject", 6),
    ("terrible", 6),
];

fn standard_level(label: &str) -> Option<u32> {
    let label = label.trim().to_lowercase();
    GRADE_LEVELS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, level)| *level)
}

/// Majority judgment, with the grade scale derived from the ballots.
///
/// When every label used is a common grade name ("Excellent", "Very Good",
/// "Good", "Fair", "Poor", "Reject", ... in any case) they are ordered by
/// meaning. Otherwise the labels are ordered by descending string order, the
/// greatest string being the best grade: use [`majority_judgment_with_scale`]
/// for any other vocabulary.
pub fn majority_judgment(candidates: &[Candidate], ballots: &[GradedBallot]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let valid: HashSet<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    let labels: HashSet<&str> = ballots
        .iter()
        .flat_map(|b| b.iter())
        .filter(|(cid, _)| valid.contains(cid.as_str()))
        .map(|(_, g)| g.as_str())
        .collect();

    let levels: Option<BTreeMap<String, u32>> = labels
        .iter()
        .map(|g| standard_level(g).map(|level| (g.to_string(), level)))
        .collect();
    let levels = match levels {
        Some(levels) => levels,
        None => {
            let mut sorted: Vec<&str> = labels.into_iter().collect();
            sorted.sort_by(|a, b| b.cmp(a));
            debug!("majority_judgment: non-standard grades, using {:?}", sorted);
            sorted
                .into_iter()
                .enumerate()
                .map(|(idx, g)| (g.to_string(), idx as u32))
                .collect()
        }
    };
    judge(candidates, ballots, &levels)
}

/// Majority judgment with an explicit grade scale, best grade first.
///
/// Each candidate gets one grade per ballot; missing or unknown labels count
/// as worse than the worst grade of the scale. The candidate with the best
/// median grade wins; equal medians are compared on the whole sorted list of
/// grades, then on the id.
pub fn majority_judgment_with_scale(
    candidates: &[Candidate],
    ballots: &[GradedBallot],
    scale: &[&str],
) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let levels: BTreeMap<String, u32> = scale
        .iter()
        .enumerate()
        .rev()
        .map(|(idx, g)| (g.to_string(), idx as u32))
        .collect();
    judge(candidates, ballots, &levels)
}

fn judge(candidates: &[Candidate], ballots: &[GradedBallot], levels: &BTreeMap<String, u32>) -> Results {
    let missing = levels.values().max().map_or(0, |m| m + 1);
    let mut profiles: BTreeMap<String, (u32, Vec<u32>)> = BTreeMap::new();
    for c in candidates.iter() {
        let mut ranks: Vec<u32> = ballots
            .iter()
            .map(|b| {
                b.get(&c.id)
                    .and_then(|g| levels.get(g))
                    .cloned()
                    .unwrap_or(missing)
            })
            .collect();
        ranks.sort_unstable();
        let median = ranks[ranks.len() / 2];
        profiles.insert(c.id.clone(), (median, ranks));
    }
    debug!("majority_judgment: profiles {:?}", profiles);
    // BTreeMap order: the first of equal profiles has the smallest id.
    let winner_id = profiles
        .iter()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(cid, _)| cid.clone());
    let tallies: BTreeMap<String, f64> = profiles
        .iter()
        .map(|(cid, (median, _))| (cid.clone(), *median as f64))
        .collect();
    finish(
        "majority_judgment",
        candidates,
        winner_id.as_deref(),
        vec![crate::single_round(tallies)],
    )
}

// **** 3-2-1 ****

fn three_two_one_level(grade: Option<&String>) -> u32 {
    match grade.map(|g| g.trim().to_lowercase()).as_deref() {
        Some("good") => 3,
        Some("ok") => 2,
        Some("bad") => 1,
        _ => 0,
    }
}

/// 3-2-1 voting, over "Good" / "OK" / "Bad" grades (any case).
///
/// 1. Candidates graded "Bad" by more than half of the ballots are dropped. If
///    this would drop everybody, the candidates with the fewest "Bad" grades are
///    kept instead.
/// 2. The three survivors with the most "Good" grades go on.
/// 3. The finalist winning the most head-to-head comparisons (Good > OK > Bad >
///    no grade) wins.
pub fn three_two_one(candidates: &[Candidate], ballots: &[GradedBallot]) -> Results {
    if candidates.is_empty() || ballots.is_empty() {
        return Results::empty();
    }
    let n = ballots.len() as f64;
    let count_level = |cid: &str, level: u32| -> f64 {
        ballots
            .iter()
            .filter(|b| three_two_one_level(b.get(cid)) == level)
            .count() as f64
    };

    // Stage 1: rejection.
    let bad: BTreeMap<String, f64> = candidates
        .iter()
        .map(|c| (c.id.clone(), count_level(&c.id, 1)))
        .collect();
    let mut rejected: Vec<String> = bad
        .iter()
        .filter(|&(_, &b)| 2.0 * b > n)
        .map(|(cid, _)| cid.clone())
        .collect();
    if rejected.len() == bad.len() {
        let fewest = bad.values().cloned().fold(f64::INFINITY, f64::min);
        rejected.retain(|cid| bad[cid] > fewest);
        debug!("three_two_one: everybody rejected, keeping {} bad grades", fewest);
    }
    let survivors: Vec<String> = bad
        .keys()
        .filter(|cid| !rejected.contains(*cid))
        .cloned()
        .collect();

    // Stage 2: semifinalists.
    let good: BTreeMap<String, f64> = survivors
        .iter()
        .map(|cid| (cid.clone(), count_level(cid, 3)))
        .collect();
    let by_good = ranked_by_tally(&good);
    let finalists: Vec<String> = by_good.iter().take(3).cloned().collect();

    // Stage 3: head-to-head among the finalists.
    let mut wins: BTreeMap<String, f64> = finalists.iter().map(|cid| (cid.clone(), 0.0)).collect();
    for x in finalists.iter() {
        for y in finalists.iter().filter(|y| *y != x) {
            let (mut x_over_y, mut y_over_x) = (0, 0);
            for b in ballots.iter() {
                match three_two_one_level(b.get(x)).cmp(&three_two_one_level(b.get(y))) {
                    Ordering::Greater => x_over_y += 1,
                    Ordering::Less => y_over_x += 1,
                    Ordering::Equal => {}
                }
            }
            if x_over_y > y_over_x {
                if let Some(w) = wins.get_mut(x) {
                    *w += 1.0;
                }
            }
        }
    }
    debug!("three_two_one: bad {:?} good {:?} wins {:?}", bad, good, wins);
    let winner_id = crate::argmax(&wins).map(|s| s.to_string());

    let rounds = vec![
        RoundRecord {
            round: 1,
            tallies: bad,
            eliminated: rejected,
        },
        RoundRecord {
            round: 2,
            tallies: good,
            eliminated: by_good.into_iter().skip(3).collect(),
        },
        RoundRecord {
            round: 3,
            tallies: wins,
            eliminated: Vec::new(),
        },
    ];
    finish("three_two_one", candidates, winner_id.as_deref(), rounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use std::collections::HashMap;

    fn approvals(v: &[&[&str]]) -> Vec<ApprovalBallot> {
        v.iter().map(|b| b.iter().map(|s| s.to_string()).collect()).collect()
    }

    fn scores(v: &[&[(&str, f64)]]) -> Vec<ScoreBallot> {
        v.iter()
            .map(|b| b.iter().map(|(k, s)| (k.to_string(), *s)).collect())
            .collect()
    }

    fn grades(v: &[&[(&str, &str)]]) -> Vec<GradedBallot> {
        v.iter()
            .map(|b| {
                b.iter()
                    .map(|(k, g)| (k.to_string(), g.to_string()))
                    .collect::<HashMap<String, String>>()
            })
            .collect()
    }

    fn tally(r: &RoundRecord, cid: &str) -> f64 {
        r.tallies[cid]
    }

    #[test]
    fn approval_counts_marks() {
        init_logs();
        let res = approval(
            &cands(&["A", "B", "C"]),
            &approvals(&[&["A", "B"], &["B"], &["B", "C"], &["Z"]]),
        );
        assert_eq!(res.winner_id(), Some("B"));
        assert_eq!(tally(&res.rounds[0], "B"), 3.0);
        assert_eq!(tally(&res.rounds[0], "A"), 1.0);
        assert_eq!(res.rounds[0].tallies.len(), 3);
    }

    fn star_profile() -> Vec<ScoreBallot> {
        scores(&[
            &[("A", 5.0), ("B", 3.0)],
            &[("A", 0.0), ("B", 4.0), ("C", 5.0)],
            &[("C", 2.0), ("X", 10.0)],
        ])
    }

    #[test]
    fn score_and_star_disagree() {
        let cs = cands(&["A", "B", "C"]);
        let s = score(&cs, &star_profile());
        // B and C both total 7.
        assert_eq!(s.winner_id(), Some("B"));

        let st = star(&cs, &star_profile());
        assert_eq!(st.rounds.len(), 2);
        assert_eq!(st.rounds[0].eliminated, vec!["A".to_string()]);
        assert_eq!(tally(&st.rounds[1], "B"), 1.0);
        assert_eq!(tally(&st.rounds[1], "C"), 2.0);
        assert_eq!(st.winner_id(), Some("C"));
    }

    #[test]
    fn star_runoff_tie_goes_to_higher_total() {
        let cs = cands(&["A", "B", "C"]);
        let ballots = scores(&[&[("A", 0.0), ("B", 5.0)], &[("A", 1.0), ("B", 0.0)], &[("C", 0.5)]]);
        let res = star(&cs, &ballots);
        assert_eq!(tally(&res.rounds[1], "A"), 1.0);
        assert_eq!(tally(&res.rounds[1], "B"), 1.0);
        assert_eq!(res.winner_id(), Some("B"));
    }

    #[test]
    fn star_single_candidate() {
        let res = star(&cands(&["A"]), &scores(&[&[("A", 1.0)]]));
        assert_eq!(res.winner_id(), Some("A"));
        assert_eq!(res.rounds.len(), 1);
    }

    fn judged() -> Vec<GradedBallot> {
        grades(&[
            &[("A", "Excellent"), ("B", "Good"), ("C", "Poor")],
            &[("A", "Good"), ("B", "Good"), ("C", "Poor")],
            &[("A", "Excellent"), ("B", "Fair"), ("C", "Good")],
            &[("A", "Poor"), ("B", "Fair"), ("C", "Poor")],
        ])
    }

    #[test]
    fn majority_judgment_with_common_grades() {
        let res = majority_judgment(&cands(&["A", "B", "C"]), &judged());
        assert_eq!(res.winner_id(), Some("A"));
        let r = &res.rounds[0];
        assert_eq!(tally(r, "A"), 2.0);
        assert_eq!(tally(r, "B"), 3.0);
        assert_eq!(tally(r, "C"), 4.0);
    }

    #[test]
    fn majority_judgment_breaks_median_ties_on_the_profile() {
        let ballots = grades(&[
            &[("A", "excellent"), ("B", "very good")],
            &[("A", "GOOD"), ("B", "good")],
            &[("A", "good"), ("B", "good")],
        ]);
        let res = majority_judgment(&cands(&["B", "A"]), &ballots);
        assert_eq!(tally(&res.rounds[0], "A"), tally(&res.rounds[0], "B"));
        assert_eq!(res.winner_id(), Some("A"));
    }

    #[test]
    fn majority_judgment_other_vocabularies() {
        let cs = cands(&["A", "B"]);
        let ballots = grades(&[&[("A", "1"), ("B", "3")], &[("A", "2"), ("B", "3")], &[("A", "1")]]);
        // Descending string order: "3" is the best grade. B's missing grade is the worst.
        let res = majority_judgment(&cs, &ballots);
        assert_eq!(res.winner_id(), Some("B"));

        let res = majority_judgment_with_scale(&cs, &ballots, &["1", "2", "3"]);
        assert_eq!(res.winner_id(), Some("A"));
        assert_eq!(tally(&res.rounds[0], "A"), 0.0);
        assert_eq!(tally(&res.rounds[0], "B"), 2.0);
    }

    fn three_two_one_profile() -> Vec<GradedBallot> {
        grades(&[
            &[("A", "Good"), ("B", "OK"), ("C", "Bad"), ("D", "Bad"), ("E", "OK")],
            &[("A", "OK"), ("B", "Good"), ("C", "Bad"), ("D", "Bad"), ("E", "Good")],
            &[("A", "Bad"), ("B", "Good"), ("C", "Good"), ("D", "Bad"), ("E", "OK")],
            &[("A", "Good"), ("B", "Bad"), ("C", "OK"), ("D", "OK"), ("E", "Bad")],
            &[("A", "Good"), ("B", "OK"), ("C", "Bad"), ("D", "Good"), ("F", "Good")],
        ])
    }

    #[test]
    fn three_two_one_stages() {
        let cs = cands(&["A", "B", "C", "D", "E", "F"]);
        let res = three_two_one(&cs, &three_two_one_profile());
        assert_eq!(res.rounds.len(), 3);
        assert_eq!(
            res.rounds[0].eliminated,
            vec!["C".to_string(), "D".to_string()]
        );
        // Survivors A, B, E, F with 3, 2, 1, 1 good grades.
        assert_eq!(tally(&res.rounds[1], "A"), 3.0);
        assert_eq!(tally(&res.rounds[1], "F"), 1.0);
        assert_eq!(res.rounds[1].eliminated, vec!["F".to_string()]);
        // A beats B and E 3-2, B beats E 2-0.
        assert_eq!(tally(&res.rounds[2], "A"), 2.0);
        assert_eq!(tally(&res.rounds[2], "B"), 1.0);
        assert_eq!(tally(&res.rounds[2], "E"), 0.0);
        assert_eq!(res.winner_id(), Some("A"));
    }

    #[test]
    fn three_two_one_everybody_rejected() {
        let cs = cands(&["A", "B"]);
        let ballots = grades(&[
            &[("A", "bad"), ("B", "bad")],
            &[("A", "bad"), ("B", "bad")],
            &[("A", "ok"), ("B", "bad")],
        ]);
        let res = three_two_one(&cs, &ballots);
        assert_eq!(res.rounds[0].eliminated, vec!["B".to_string()]);
        assert_eq!(res.winner_id(), Some("A"));
    }

    #[test]
    fn empty_inputs() {
        let cs = cands(&["A"]);
        assert_eq!(approval(&cs, &[]), Results::empty());
        assert_eq!(score(&[], &star_profile()), Results::empty());
        assert_eq!(star(&cs, &[]), Results::empty());
        assert_eq!(majority_judgment(&cs, &[]), Results::empty());
        assert_eq!(majority_judgment_with_scale(&[], &judged(), &["Good"]), Results::empty());
        assert_eq!(three_two_one(&cs, &[]), Results::empty());
    }
}
