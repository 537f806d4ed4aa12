use log::info;
use rand::Rng;
use std::fmt::Display;
use std::str::FromStr;

use crate::cardinal;
use crate::condorcet;
use crate::config::*;
use crate::elimination;
use crate::positional;
use crate::stochastic;

/// Every method of the library, addressable by name.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Method {
    Plurality,
    AntiPlurality,
    BordaCount,
    Dowdall,
    Veto,
    FiveThreeOne,
    TwoRoundRunoff,
    InstantRunoff,
    Coombs,
    Bucklin,
    Baldwin,
    Nanson,
    Minimax,
    Copeland,
    BlackRule,
    SmithIrv,
    RankedPairs,
    SchulzeMethod,
    KemenyYoung,
    Dodgson,
    Young,
    RandomDictatorship,
    Approval,
    Score,
    Star,
    MajorityJudgment,
    ThreeTwoOne,
    MaxUtility,
}

impl Method {
    pub const ALL: [Method; 28] = [
        Method::Plurality,
        Method::AntiPlurality,
        Method::BordaCount,
        Method::Dowdall,
        Method::Veto,
        Method::FiveThreeOne,
        Method::TwoRoundRunoff,
        Method::InstantRunoff,
        Method::Coombs,
        Method::Bucklin,
        Method::Baldwin,
        Method::Nanson,
        Method::Minimax,
        Method::Copeland,
        Method::BlackRule,
        Method::SmithIrv,
        Method::RankedPairs,
        Method::SchulzeMethod,
        Method::KemenyYoung,
        Method::Dodgson,
        Method::Young,
        Method::RandomDictatorship,
        Method::Approval,
        Method::Score,
        Method::Star,
        Method::MajorityJudgment,
        Method::ThreeTwoOne,
        Method::MaxUtility,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Method::Plurality => "plurality",
            Method::AntiPlurality => "anti_plurality",
            Method::BordaCount => "borda_count",
            Method::Dowdall => "dowdall",
            Method::Veto => "veto",
            Method::FiveThreeOne => "five_three_one",
            Method::TwoRoundRunoff => "two_round_runoff",
            Method::InstantRunoff => "instant_runoff",
            Method::Coombs => "coombs",
            Method::Bucklin => "bucklin",
            Method::Baldwin => "baldwin",
            Method::Nanson => "nanson",
            Method::Minimax => "minimax",
            Method::Copeland => "copeland",
            Method::BlackRule => "black_rule",
            Method::SmithIrv => "smith_irv",
            Method::RankedPairs => "ranked_pairs",
            Method::SchulzeMethod => "schulze_method",
            Method::KemenyYoung => "kemeny_young",
            Method::Dodgson => "dodgson",
            Method::Young => "young",
            Method::RandomDictatorship => "random_dictatorship",
            Method::Approval => "approval",
            Method::Score => "score",
            Method::Star => "star",
            Method::MajorityJudgment => "majority_judgment",
            Method::ThreeTwoOne => "three_two_one",
            Method::MaxUtility => "max_utility",
        }
    }

    /// The ballots this method reads.
    pub fn ballot_kind(&self) -> BallotKind {
        match self {
            Method::Approval => BallotKind::Approval,
            Method::Score | Method::Star => BallotKind::Scored,
            Method::MajorityJudgment | Method::ThreeTwoOne => BallotKind::Graded,
            Method::MaxUtility => BallotKind::Utility,
            _ => BallotKind::Ranked,
        }
    }

    /// True for the methods that take [`VoteRules`] into account.
    pub fn uses_rules(&self) -> bool {
        matches!(
            self,
            Method::InstantRunoff
                | Method::Coombs
                | Method::Baldwin
                | Method::Nanson
                | Method::SmithIrv
        )
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Method {
    type Err = VotingErrors;

    /// Accepts the method names, in any case, with `-` or `_` as separator.
    /// `approval_voting`, `score_voting`, `star_voting` and
    /// `three_two_one_voting` are accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase().replace('-', "_");
        let norm = norm
            .strip_suffix("_voting")
            .filter(|base| matches!(*base, "approval" | "score" | "star" | "three_two_one"))
            .unwrap_or(&norm);
        Method::ALL
            .iter()
            .find(|m| m.name() == norm)
            .cloned()
            .ok_or_else(|| VotingErrors::UnknownMethod(s.to_string()))
    }
}

/// A collection of ballots, tagged by kind.
#[derive(PartialEq, Debug, Clone)]
pub enum Ballots {
    Ranked(Vec<Vote>),
    Approval(Vec<ApprovalBallot>),
    Scored(Vec<ScoreBallot>),
    Graded(Vec<GradedBallot>),
    Utility(Vec<UtilityBallot>),
}

impl Ballots {
    /// Ranked ballots, each cast once.
    pub fn ranked(ballots: Vec<Ballot>) -> Ballots {
        Ballots::Ranked(ballots.into_iter().map(|b| Vote::new(b, 1)).collect())
    }

    pub fn kind(&self) -> BallotKind {
        match self {
            Ballots::Ranked(_) => BallotKind::Ranked,
            Ballots::Approval(_) => BallotKind::Approval,
            Ballots::Scored(_) => BallotKind::Scored,
            Ballots::Graded(_) => BallotKind::Graded,
            Ballots::Utility(_) => BallotKind::Utility,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Ballots::Ranked(v) => v.len(),
            Ballots::Approval(v) => v.len(),
            Ballots::Scored(v) => v.len(),
            Ballots::Graded(v) => v.len(),
            Ballots::Utility(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs the method over the ballots.
///
/// The rules only affect the elimination-round methods. `rng` is only drawn
/// from by random dictatorship.
///
/// Fails if the ballots are not of the kind the method reads.
pub fn resolve<R: Rng + ?Sized>(
    method: Method,
    candidates: &[Candidate],
    ballots: &Ballots,
    rules: &VoteRules,
    rng: &mut R,
) -> Result<Results, VotingErrors> {
    info!(
        "resolve: method {} with {} candidates and {} {} ballots",
        method,
        candidates.len(),
        ballots.len(),
        ballots.kind()
    );
    let res = match (method, ballots) {
        (Method::Plurality, Ballots::Ranked(b)) => positional::plurality(candidates, b),
        (Method::AntiPlurality, Ballots::Ranked(b)) => positional::anti_plurality(candidates, b),
        (Method::BordaCount, Ballots::Ranked(b)) => positional::borda_count(candidates, b),
        (Method::Dowdall, Ballots::Ranked(b)) => positional::dowdall(candidates, b),
        (Method::Veto, Ballots::Ranked(b)) => positional::veto(candidates, b),
        (Method::FiveThreeOne, Ballots::Ranked(b)) => positional::five_three_one(candidates, b),
        (Method::TwoRoundRunoff, Ballots::Ranked(b)) => {
            elimination::two_round_runoff(candidates, b)
        }
        (Method::InstantRunoff, Ballots::Ranked(b)) => {
            elimination::instant_runoff_with_rules(candidates, b, rules)
        }
        (Method::Coombs, Ballots::Ranked(b)) => {
            elimination::run_elimination(candidates, b, elimination::EliminationKind::Coombs, rules)
        }
        (Method::Bucklin, Ballots::Ranked(b)) => elimination::bucklin(candidates, b),
        (Method::Baldwin, Ballots::Ranked(b)) => elimination::run_elimination(
            candidates,
            b,
            elimination::EliminationKind::Baldwin,
            rules,
        ),
        (Method::Nanson, Ballots::Ranked(b)) => {
            elimination::run_elimination(candidates, b, elimination::EliminationKind::Nanson, rules)
        }
        (Method::Minimax, Ballots::Ranked(b)) => condorcet::minimax(candidates, b),
        (Method::Copeland, Ballots::Ranked(b)) => condorcet::copeland(candidates, b),
        (Method::BlackRule, Ballots::Ranked(b)) => condorcet::black_rule(candidates, b),
        (Method::SmithIrv, Ballots::Ranked(b)) => {
            condorcet::smith_irv_with_rules(candidates, b, rules)
        }
        (Method::RankedPairs, Ballots::Ranked(b)) => condorcet::ranked_pairs(candidates, b),
        (Method::SchulzeMethod, Ballots::Ranked(b)) => condorcet::schulze_method(candidates, b),
        (Method::KemenyYoung, Ballots::Ranked(b)) => condorcet::kemeny_young(candidates, b),
        (Method::Dodgson, Ballots::Ranked(b)) => condorcet::dodgson(candidates, b),
        (Method::Young, Ballots::Ranked(b)) => condorcet::young(candidates, b),
        (Method::RandomDictatorship, Ballots::Ranked(b)) => {
            stochastic::random_dictatorship(candidates, b, rng)
        }
        (Method::Approval, Ballots::Approval(b)) => cardinal::approval(candidates, b),
        (Method::Score, Ballots::Scored(b)) => cardinal::score(candidates, b),
        (Method::Star, Ballots::Scored(b)) => cardinal::star(candidates, b),
        (Method::MajorityJudgment, Ballots::Graded(b)) => {
            cardinal::majority_judgment(candidates, b)
        }
        (Method::ThreeTwoOne, Ballots::Graded(b)) => cardinal::three_two_one(candidates, b),
        (Method::MaxUtility, Ballots::Utility(b)) => stochastic::max_utility(candidates, b),
        (m, b) => {
            return Err(VotingErrors::BallotKindMismatch {
                method: m.name().to_string(),
                expected: m.ballot_kind(),
                found: b.kind(),
            })
        }
    };
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn names_round_trip() {
        for m in Method::ALL.iter() {
            assert_eq!(Method::from_str(m.name()), Ok(*m));
            assert_eq!(m.to_string(), m.name());
        }
        assert_eq!(Method::from_str("Instant-Runoff"), Ok(Method::InstantRunoff));
        assert_eq!(Method::from_str("approval_voting"), Ok(Method::Approval));
        assert_eq!(Method::from_str("three_two_one_voting"), Ok(Method::ThreeTwoOne));
        assert_eq!(
            Method::from_str("plurality_voting"),
            Err(VotingErrors::UnknownMethod("plurality_voting".to_string()))
        );
        assert!(matches!(
            "condorcet".parse::<Method>(),
            Err(VotingErrors::UnknownMethod(_))
        ));
    }

    #[test]
    fn only_elimination_methods_read_the_rules() {
        let with_rules: Vec<&str> = Method::ALL
            .iter()
            .filter(|m| m.uses_rules())
            .map(|m| m.name())
            .collect();
        assert_eq!(
            with_rules,
            vec!["instant_runoff", "coombs", "baldwin", "nanson", "smith_irv"]
        );
    }

    #[test]
    fn every_ranked_method_resolves_the_condorcet_profile() {
        init_logs();
        let cs = cands(&["A", "B", "C"]);
        let ballots = Ballots::ranked(condorcet_profile());
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for m in Method::ALL.iter().filter(|m| m.ballot_kind() == BallotKind::Ranked) {
            let res = resolve(*m, &cs, &ballots, &VoteRules::DEFAULT_RULES, &mut rng)
                .unwrap_or_else(|e| panic!("{}: {}", m, e));
            assert!(res.winner.is_some(), "{}", m);
            if *m != Method::RandomDictatorship {
                assert_eq!(res.winner_id(), Some("A"), "{}", m);
            }
        }
    }

    #[test]
    fn dispatch_matches_direct_calls() {
        let cs = cands(&["A", "B", "C"]);
        let ballots = split_profile();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let rules = VoteRules::DEFAULT_RULES;
        let tagged = Ballots::ranked(ballots.clone());
        assert_eq!(
            resolve(Method::InstantRunoff, &cs, &tagged, &rules, &mut rng),
            Ok(crate::instant_runoff(&cs, &ballots))
        );
        assert_eq!(
            resolve(Method::Coombs, &cs, &tagged, &rules, &mut rng),
            Ok(crate::coombs(&cs, &ballots))
        );
        assert_eq!(
            resolve(Method::SmithIrv, &cs, &tagged, &rules, &mut rng),
            Ok(crate::smith_irv(&cs, &ballots))
        );
        let r1 = resolve(
            Method::RandomDictatorship,
            &cs,
            &tagged,
            &rules,
            &mut ChaCha20Rng::seed_from_u64(9),
        );
        let r2 = crate::random_dictatorship(&cs, &ballots, &mut ChaCha20Rng::seed_from_u64(9));
        assert_eq!(r1, Ok(r2));
    }

    #[test]
    fn counted_votes_tally_like_repeated_ballots() {
        let cs = cands(&["A", "B", "C"]);
        let counted = Ballots::Ranked(vec![
            Vote::new(vec!["A".to_string(), "B".to_string()], 3),
            Vote::new(vec!["B".to_string(), "C".to_string()], 2),
            Vote::new(vec!["C".to_string(), "B".to_string()], 2),
            Vote::new(vec!["C".to_string()], 0),
        ]);
        let repeated = Ballots::ranked(ranked(&[
            &["A", "B"],
            &["A", "B"],
            &["A", "B"],
            &["B", "C"],
            &["B", "C"],
            &["C", "B"],
            &["C", "B"],
        ]));
        let rules = VoteRules::DEFAULT_RULES;
        for m in Method::ALL.iter().filter(|m| m.ballot_kind() == BallotKind::Ranked) {
            let mut rng = ChaCha20Rng::seed_from_u64(1);
            let r1 = resolve(*m, &cs, &counted, &rules, &mut rng);
            let r2 = resolve(*m, &cs, &repeated, &rules, &mut rng);
            // The draw itself depends on how the ballots are laid out.
            if *m == Method::RandomDictatorship {
                assert_eq!(r1.map(|r| r.rounds), r2.map(|r| r.rounds), "{}", m);
            } else {
                assert_eq!(r1, r2, "{}", m);
            }
        }
    }

    #[test]
    fn wrong_ballot_kind_is_an_error() {
        let cs = cands(&["A"]);
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let err = resolve(
            Method::Star,
            &cs,
            &Ballots::Ranked(vec![]),
            &VoteRules::DEFAULT_RULES,
            &mut rng,
        );
        assert_eq!(
            err,
            Err(VotingErrors::BallotKindMismatch {
                method: "star".to_string(),
                expected: BallotKind::Scored,
                found: BallotKind::Ranked,
            })
        );
        assert!(resolve(
            Method::Plurality,
            &cs,
            &Ballots::Utility(vec![]),
            &VoteRules::DEFAULT_RULES,
            &mut rng
        )
        .is_err());
    }

    #[test]
    fn empty_ballots_resolve_to_nothing() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let cs = cands(&["A", "B"]);
        for m in Method::ALL.iter() {
            let ballots = match m.ballot_kind() {
                BallotKind::Ranked => Ballots::Ranked(vec![]),
                BallotKind::Approval => Ballots::Approval(vec![]),
                BallotKind::Scored => Ballots::Scored(vec![]),
                BallotKind::Graded => Ballots::Graded(vec![]),
                BallotKind::Utility => Ballots::Utility(vec![]),
            };
            let res = resolve(*m, &cs, &ballots, &VoteRules::DEFAULT_RULES, &mut rng);
            assert_eq!(res, Ok(Results::empty()), "{}", m);
        }
    }
}
