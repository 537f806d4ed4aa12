// ********* Input data structures ***********

use std::collections::{BTreeMap, HashMap, HashSet};
use std::error::Error;
use std::fmt::Display;

/// A registered candidate.
///
/// The `id` is what ballots refer to. It must be unique within an election and is
/// also the key of every tie-break: ties always go to the smallest id.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    pub id: String,
    pub name: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Candidate {
        Candidate {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A ranked ballot: candidate ids, most preferred first.
///
/// Ballots may be truncated and may contain duplicates or ids that are not
/// registered. Only the first occurrence of a registered id is taken into account.
pub type Ballot = Vec<String>;

/// A ranked ballot cast `count` times.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Vote {
    pub choices: Ballot,
    pub count: u64,
}

impl Vote {
    pub fn new(choices: Ballot, count: u64) -> Vote {
        Vote { choices, count }
    }
}

/// Anything the ranked resolvers can tally: a ranking and the number of voters
/// who cast it.
pub trait RankedBallot {
    fn choices(&self) -> &[String];

    fn count(&self) -> u64 {
        1
    }
}

impl RankedBallot for Ballot {
    fn choices(&self) -> &[String] {
        self
    }
}

impl RankedBallot for Vote {
    fn choices(&self) -> &[String] {
        &self.choices
    }

    fn count(&self) -> u64 {
        self.count
    }
}

/// The set of candidates approved by one voter.
pub type ApprovalBallot = HashSet<String>;

/// A numeric score per candidate (score voting, STAR).
pub type ScoreBallot = HashMap<String, f64>;

/// A grade label per candidate (majority judgment, 3-2-1).
pub type GradedBallot = HashMap<String, String>;

/// A declared utility per candidate.
pub type UtilityBallot = HashMap<String, f64>;

// ******** Output data structures *********

/// Statistics for one round.
///
/// The keys of `tallies` are exactly the candidates still considered in this round.
/// `eliminated` lists the candidates dropped at the end of this round, if any.
#[derive(PartialEq, Debug, Clone)]
pub struct RoundRecord {
    pub round: u32,
    pub tallies: BTreeMap<String, f64>,
    pub eliminated: Vec<String>,
}

/// The outcome of one resolver invocation.
#[derive(PartialEq, Debug, Clone)]
pub struct Results {
    pub winner: Option<Candidate>,
    pub rounds: Vec<RoundRecord>,
}

impl Results {
    /// No winner and no rounds: the answer to an empty election.
    pub fn empty() -> Results {
        Results {
            winner: None,
            rounds: Vec::new(),
        }
    }

    pub fn winner_id(&self) -> Option<&str> {
        self.winner.as_ref().map(|c| c.id.as_str())
    }
}

/// The shape of the ballots expected by a method.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum BallotKind {
    Ranked,
    Approval,
    Scored,
    Graded,
    Utility,
}

impl Display for BallotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BallotKind::Ranked => "ranked",
            BallotKind::Approval => "approval",
            BallotKind::Scored => "scored",
            BallotKind::Graded => "graded",
            BallotKind::Utility => "utility",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised when selecting a method or dispatching ballots to it.
///
/// Resolvers themselves never fail.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    UnknownMethod(String),
    DuplicateCandidate(String),
    BallotKindMismatch {
        method: String,
        expected: BallotKind,
        found: BallotKind,
    },
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::UnknownMethod(name) => write!(f, "unknown voting method {:?}", name),
            VotingErrors::DuplicateCandidate(id) => write!(f, "candidate {:?} is registered twice", id),
            VotingErrors::BallotKindMismatch {
                method,
                expected,
                found,
            } => write!(
                f,
                "method {} expects {} ballots but received {} ballots",
                method, expected, found
            ),
        }
    }
}

// ********* Configuration **********

/// How a tie for elimination is broken.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// The tied candidate with the smallest id is eliminated first.
    Alphabetical,
    /// The tied candidates are ordered by a SHA-256 digest of the seed, the round
    /// number and the candidate id. Reproducible, but not guessable in advance.
    Hashed(u32),
}

/// The elimination algorithm to apply.
///
/// - Single eliminates one candidate at a time.
///
/// - Batch eliminates at once all the trailing candidates whose combined votes
/// cannot reach the next candidate up. It only applies to instant-runoff, and
/// falls back to single elimination when no such batch exists.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum EliminationAlgorithm {
    Batch,
    Single,
}

/// Rules for the elimination-round methods (instant-runoff, Coombs, Baldwin,
/// Nanson, Smith-IRV).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRules {
    pub tiebreak_mode: TieBreakMode,
    pub elimination_algorithm: EliminationAlgorithm,
}

impl VoteRules {
    pub const DEFAULT_RULES: VoteRules = VoteRules {
        tiebreak_mode: TieBreakMode::Alphabetical,
        elimination_algorithm: EliminationAlgorithm::Single,
    };
}

impl Default for VoteRules {
    fn default() -> Self {
        VoteRules::DEFAULT_RULES
    }
}
