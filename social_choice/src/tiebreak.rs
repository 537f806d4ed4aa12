use log::debug;

use crate::config::TieBreakMode;

/// Orders tied candidates for elimination: the first element goes first.
pub(crate) fn elimination_order(tied: &[String], mode: TieBreakMode, num_round: u32) -> Vec<String> {
    let mut res: Vec<String> = tied.to_vec();
    match mode {
        TieBreakMode::Alphabetical => {
            res.sort();
        }
        TieBreakMode::Hashed(seed) => {
            res = candidate_permutation_crypto(tied, seed, num_round);
        }
    }
    debug!(
        "elimination_order: round {} mode {:?}: {:?}",
        num_round, mode, res
    );
    res
}

/// Generates a "random" permutation of the candidates. Random in this context means hard to guess in advance.
/// This uses a cryptographic hash that is resilient to collisions; the id settles equal digests.
fn candidate_permutation_crypto(candidates: &[String], seed: u32, num_round: u32) -> Vec<String> {
    let mut data: Vec<(String, String)> = candidates
        .iter()
        .map(|cid| {
            let digest = sha256::digest(format!("{:08}{:08}{}", seed, num_round, cid));
            (digest, cid.clone())
        })
        .collect();
    data.sort();
    data.into_iter().map(|(_, cid)| cid).collect()
}
