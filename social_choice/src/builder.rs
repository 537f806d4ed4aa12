use log::debug;
use rand::Rng;
use std::collections::HashSet;

pub use crate::config::*;
use crate::methods::{resolve, Ballots, Method};

/// A builder for assembling a ranked election.
///
/// ```
/// use social_choice::builder::Builder;
/// use social_choice::{Candidate, Method, VoteRules};
/// # use social_choice::VotingErrors;
///
/// let mut builder = Builder::new(&VoteRules::DEFAULT_RULES)?
///     .candidates(&[Candidate::new("A", "Anna"), Candidate::new("B", "Bob")])?;
///
/// builder.add_vote_simple(&["A".to_string(), "".to_string()])?;
/// builder.add_vote(&["B".to_string(), "A".to_string()], 2)?;
///
/// let res = builder.resolve(Method::InstantRunoff, &mut rand::thread_rng())?;
/// assert_eq!(res.winner_id(), Some("B"));
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: VoteRules,
    pub(crate) _candidates: Vec<Candidate>,
    pub(crate) _excluded: HashSet<String>,
    pub(crate) _votes: Vec<Vote>,
}

impl Builder {
    pub fn new(rules: &VoteRules) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
            _excluded: HashSet::new(),
            _votes: Vec::new(),
        })
    }

    /// Registers the candidates. Ids must be unique.
    pub fn candidates(self, cands: &[Candidate]) -> Result<Builder, VotingErrors> {
        let mut seen: HashSet<&str> = HashSet::new();
        for c in cands.iter() {
            if !seen.insert(c.id.as_str()) {
                return Err(VotingErrors::DuplicateCandidate(c.id.clone()));
            }
        }
        Ok(Builder {
            _candidates: cands.to_vec(),
            ..self
        })
    }

    /// Withdraws a candidate: it is not registered anymore, and the ballots
    /// naming it fall through to their next choices.
    pub fn exclude(mut self, id: &str) -> Builder {
        self._excluded.insert(id.to_string());
        self
    }

    /// Adds a vote to the builder.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_vote_simple(&mut self, choices: &[String]) -> Result<(), VotingErrors> {
        self.add_vote(choices, 1)
    }

    /// Adds a vote cast `count` times. The count is kept as a weight.
    ///
    /// choices: the ids chosen by the voter, in order. Blank entries are dropped.
    /// Unknown ids and repeated ids are kept, the resolvers ignore them.
    pub fn add_vote(&mut self, choices: &[String], count: u64) -> Result<(), VotingErrors> {
        let ballot: Ballot = choices
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();
        debug!("add_vote: {:?} x {}", ballot, count);
        if count > 0 {
            self._votes.push(Vote::new(ballot, count));
        }
        Ok(())
    }

    /// The registered candidates, minus the excluded ones.
    pub fn registered_candidates(&self) -> Vec<Candidate> {
        self._candidates
            .iter()
            .filter(|c| !self._excluded.contains(&c.id))
            .cloned()
            .collect()
    }

    pub fn votes(&self) -> &[Vote] {
        &self._votes
    }

    pub fn rules(&self) -> &VoteRules {
        &self._rules
    }

    /// Resolves the election with a ranked-ballot method.
    pub fn resolve<R: Rng + ?Sized>(&self, method: Method, rng: &mut R) -> Result<Results, VotingErrors> {
        let ballots = Ballots::Ranked(self._votes.clone());
        resolve(method, &self.registered_candidates(), &ballots, &self._rules, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn votes_are_counted_and_cleaned() {
        let mut b = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&cands(&["A", "B"]))
            .unwrap();
        b.add_vote(&ids(&["A", " ", "B"]), 3).unwrap();
        b.add_vote(&ids(&["Z"]), 0).unwrap();
        b.add_vote_simple(&ids(&["", "Z", "B"])).unwrap();
        assert_eq!(
            b.votes(),
            &[Vote::new(ids(&["A", "B"]), 3), Vote::new(ids(&["Z", "B"]), 1)]
        );
    }

    #[test]
    fn large_counts_are_stored_once() {
        let mut b = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&cands(&["A", "B"]))
            .unwrap();
        b.add_vote(&ids(&["A"]), 4_000_000_000).unwrap();
        b.add_vote(&ids(&["B", "A"]), 3_999_999_999).unwrap();
        assert_eq!(b.votes().len(), 2);
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let res = b.resolve(Method::Plurality, &mut rng).unwrap();
        assert_eq!(res.winner_id(), Some("A"));
        assert_eq!(res.rounds[0].tallies["A"], 4_000_000_000.0);
        assert_eq!(res.rounds[0].tallies["B"], 3_999_999_999.0);
    }

    #[test]
    fn a_counted_vote_tallies_like_its_copies() {
        let mut counted = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&cands(&["A", "B", "C"]))
            .unwrap();
        counted.add_vote(&ids(&["B", "C"]), 3).unwrap();
        counted.add_vote(&ids(&["A"]), 2).unwrap();
        counted.add_vote(&ids(&["C", "A"]), 2).unwrap();

        let mut copies = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&cands(&["A", "B", "C"]))
            .unwrap();
        for _ in 0..3 {
            copies.add_vote_simple(&ids(&["B", "C"])).unwrap();
        }
        for _ in 0..2 {
            copies.add_vote_simple(&ids(&["A"])).unwrap();
            copies.add_vote_simple(&ids(&["C", "A"])).unwrap();
        }

        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let methods = [
            Method::InstantRunoff,
            Method::BordaCount,
            Method::SchulzeMethod,
            Method::Bucklin,
        ];
        for m in methods {
            assert_eq!(
                counted.resolve(m, &mut rng).unwrap(),
                copies.resolve(m, &mut rng).unwrap(),
                "{}",
                m
            );
        }
        let irv = counted.resolve(Method::InstantRunoff, &mut rng).unwrap();
        assert_eq!(irv.rounds[0].tallies["B"], 3.0);
        assert_eq!(irv.rounds[0].eliminated, vec!["A".to_string()]);
        assert_eq!(irv.rounds[1].tallies["C"], 2.0);
        assert_eq!(irv.winner_id(), Some("B"));
    }

    #[test]
    fn duplicate_candidates_are_rejected() {
        let res = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&cands(&["A", "B", "A"]));
        assert!(matches!(res, Err(VotingErrors::DuplicateCandidate(id)) if id == "A"));
    }

    #[test]
    fn excluded_candidates_are_skipped() {
        let mut b = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&cands(&["A", "B", "C"]))
            .unwrap()
            .exclude("A");
        b.add_vote(&ids(&["A", "C"]), 2).unwrap();
        b.add_vote(&ids(&["B"]), 1).unwrap();
        assert_eq!(b.registered_candidates(), cands(&["B", "C"]));
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let res = b.resolve(Method::Plurality, &mut rng).unwrap();
        assert_eq!(res.winner_id(), Some("C"));
        assert!(!res.rounds[0].tallies.contains_key("A"));
    }

    #[test]
    fn rules_are_forwarded() {
        let rules = VoteRules {
            tiebreak_mode: TieBreakMode::Hashed(3),
            ..VoteRules::DEFAULT_RULES
        };
        let mut b = Builder::new(&rules)
            .unwrap()
            .candidates(&cands(&["A", "B", "C"]))
            .unwrap();
        for ballot in split_profile() {
            b.add_vote_simple(&ballot).unwrap();
        }
        assert_eq!(b.rules(), &rules);
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let res = b.resolve(Method::InstantRunoff, &mut rng).unwrap();
        assert_eq!(
            res,
            crate::instant_runoff_with_rules(&cands(&["A", "B", "C"]), &split_profile(), &rules)
        );
        assert!(b.resolve(Method::Star, &mut rng).is_err());
    }
}
