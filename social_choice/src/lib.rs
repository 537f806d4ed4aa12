/*!
Single-winner election methods over a fixed set of candidates.

Every resolver takes the registered candidates and a slice of ballots of the
kind it understands, and returns a [`Results`]: the winner (if any) and the
ordered trail of rounds that led to it.

```
use social_choice::{instant_runoff, Candidate};

let candidates = vec![
    Candidate::new("A", "Anna"),
    Candidate::new("B", "Bob"),
    Candidate::new("C", "Clara"),
];
let ballots: Vec<Vec<String>> = vec![
    vec!["A".into(), "B".into(), "C".into()],
    vec!["A".into(), "C".into(), "B".into()],
    vec!["B".into(), "C".into(), "A".into()],
    vec!["C".into(), "B".into(), "A".into()],
];

let res = instant_runoff(&candidates, &ballots);
assert_eq!(res.winner_id(), Some("C"));
assert_eq!(res.rounds.len(), 2);
```

The ranked resolvers also take [`Vote`]s, rankings cast several times: a vote
with a count of n weighs as much as n copies of its ballot.

Ties are always broken in favour of the smallest candidate id, unless a method
documents otherwise. Empty inputs produce [`Results::empty`].
*/

pub mod builder;
mod cardinal;
mod condorcet;
mod config;
mod elimination;
pub mod manual;
mod methods;
mod pairwise;
mod positional;
mod stochastic;
mod tiebreak;

use std::collections::{BTreeMap, HashSet};

pub use crate::cardinal::*;
pub use crate::condorcet::*;
pub use crate::config::*;
pub use crate::elimination::*;
pub use crate::methods::*;
pub use crate::pairwise::*;
pub use crate::positional::*;
pub use crate::stochastic::*;

// **** Helpers shared by the resolvers ****

/// The registered ids, in the order the candidates were given.
fn candidate_ids(candidates: &[Candidate]) -> Vec<String> {
    candidates.iter().map(|c| c.id.clone()).collect()
}

fn find_candidate(candidates: &[Candidate], id: &str) -> Option<Candidate> {
    candidates.iter().find(|c| c.id == id).cloned()
}

/// Keeps the first occurrence of every id of `valid`, in ballot order.
fn clean_ranking<'a, S: AsRef<str>>(ballot: &'a [S], valid: &HashSet<&str>) -> Vec<&'a str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<&str> = Vec::new();
    for choice in ballot.iter() {
        let cid = choice.as_ref();
        if valid.contains(cid) && seen.insert(cid) {
            res.push(cid);
        }
    }
    res
}

/// The candidate with the highest tally. Ties go to the smallest id.
fn argmax(tallies: &BTreeMap<String, f64>) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    // BTreeMap iterates by increasing id: only a strictly larger value displaces.
    for (cid, &v) in tallies.iter() {
        match best {
            Some((_, bv)) if v <= bv => {}
            _ => best = Some((cid.as_str(), v)),
        }
    }
    best.map(|(cid, _)| cid)
}

/// The candidate with the lowest tally. Ties go to the smallest id.
fn argmin(tallies: &BTreeMap<String, f64>) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for (cid, &v) in tallies.iter() {
        match best {
            Some((_, bv)) if v >= bv => {}
            _ => best = Some((cid.as_str(), v)),
        }
    }
    best.map(|(cid, _)| cid)
}

fn single_round(tallies: BTreeMap<String, f64>) -> RoundRecord {
    RoundRecord {
        round: 1,
        tallies,
        eliminated: Vec::new(),
    }
}
