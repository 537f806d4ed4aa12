use std::collections::BTreeSet;
use std::path::Path;

use social_choice::{Ballots, Candidate};

use crate::election::ParsedBallot;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The candidates named on the ballots, sorted by id. Each id is also the name.
pub fn infer_candidates(ballots: &[ParsedBallot]) -> Vec<Candidate> {
    let ids: BTreeSet<&str> = ballots
        .iter()
        .flat_map(|pb| pb.choices.iter())
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    ids.into_iter().map(|id| Candidate::new(id, id)).collect()
}

/// The candidates rated on cardinal ballots, sorted by id. Each id is also the name.
pub fn infer_cardinal_candidates(ballots: &Ballots) -> Vec<Candidate> {
    let ids: BTreeSet<&str> = match ballots {
        Ballots::Ranked(votes) => votes
            .iter()
            .flat_map(|v| v.choices.iter())
            .map(|c| c.as_str())
            .collect(),
        Ballots::Approval(b) => b.iter().flat_map(|x| x.iter()).map(|c| c.as_str()).collect(),
        Ballots::Scored(b) => b.iter().flat_map(|x| x.keys()).map(|c| c.as_str()).collect(),
        Ballots::Graded(b) => b.iter().flat_map(|x| x.keys()).map(|c| c.as_str()).collect(),
        Ballots::Utility(b) => b.iter().flat_map(|x| x.keys()).map(|c| c.as_str()).collect(),
    };
    ids.into_iter()
        .filter(|id| !id.trim().is_empty())
        .map(|id| Candidate::new(id, id))
        .collect()
}
