use log::{debug, info, warn};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use snafu::{prelude::*, Snafu};
use social_choice::builder::Builder;
use social_choice::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::election::config_reader::*;
use crate::election::io_common::{infer_candidates, infer_cardinal_candidates, simplify_file_name};
use crate::election::io_csv::read_csv_ranking;

pub mod config_reader;
mod io_common;
mod io_csv;

#[derive(Debug, Snafu)]
pub enum ElectionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer or a column letter"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineToShort { lineno: usize },
    #[snafu(display("CSV line {lineno} has an invalid count"))]
    CsvCount { lineno: usize },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Voting error: {source}"))]
    Voting { source: VotingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ElectionResult<T> = Result<T, ElectionError>;

/// A ballot, as parsed by the readers.
/// This is before dropping the blank choices.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: String,
    pub count: u64,
    pub choices: Vec<String>,
}

/// Command-line settings taking precedence over the configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Overrides {
    pub method: Option<String>,
    pub seed: Option<u32>,
    pub input: Option<String>,
}

const DEFAULT_METHOD: &str = "instant_runoff";

fn result_stats_to_json(rs: &Results) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    let num_rounds = rs.rounds.len();
    for (idx, round_stat) in rs.rounds.iter().enumerate() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (cid, count) in round_stat.tallies.iter() {
            tally.insert(cid.clone(), json!(count.to_string()));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        for cid in round_stat.eliminated.iter() {
            tally_results.push(json!({ "eliminated": cid }));
        }
        // The winner is announced in the last round.
        if idx == num_rounds - 1 {
            if let Some(w) = rs.winner.as_ref() {
                tally_results.push(json!({ "elected": w.id }));
            }
        }

        let js = json!({"round": round_stat.round, "tally": tally, "tallyResults": tally_results});
        l.push(js);
    }
    l
}

fn build_summary_js(config: &ElectionConfig, method: Method, rv: &Results) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
        method: method.name().to_string(),
    };
    let winner: Option<JSValue> = rv
        .winner
        .as_ref()
        .map(|w| json!({"id": w.id, "name": w.name}));
    json!({
        "config": c,
        "winner": winner,
        "results": result_stats_to_json(rv) })
}

fn validate_rules(rules: &ElectionRules, seed_override: Option<u32>) -> ElectionResult<VoteRules> {
    let seed: Option<u32> = match (seed_override, rules.random_seed()?) {
        (Some(s), _) => Some(s),
        (None, s) => s,
    };
    let res = VoteRules {
        tiebreak_mode: match rules.tiebreak_mode.as_deref() {
            None | Some("alphabetical") => TieBreakMode::Alphabetical,
            Some("hashed") => match seed {
                Some(s) => TieBreakMode::Hashed(s),
                None => {
                    whatever!("The hashed tiebreak mode requires a random seed")
                }
            },
            Some(x) => {
                whatever!("Cannot use tiebreak mode {:?} (not implemented)", x)
            }
        },
        elimination_algorithm: match rules.elimination_algorithm.as_deref() {
            None | Some("single") => EliminationAlgorithm::Single,
            Some("batch") => EliminationAlgorithm::Batch,
            Some(x) => {
                whatever!("Cannot use elimination algorithm {:?} (not implemented)", x)
            }
        },
    };
    Ok(res)
}

fn make_rng(rules: &ElectionRules, seed_override: Option<u32>) -> ElectionResult<ChaCha20Rng> {
    let seed = match seed_override {
        Some(s) => Some(s),
        None => rules.random_seed()?,
    };
    Ok(match seed {
        Some(s) => ChaCha20Rng::seed_from_u64(s as u64),
        None => ChaCha20Rng::from_entropy(),
    })
}

fn read_config(config_path: &str) -> ElectionResult<(ElectionConfig, PathBuf)> {
    let config_p = Path::new(config_path);
    let config_str = fs::read_to_string(config_path).context(OpeningJsonSnafu {
        path: config_path.to_string(),
    })?;
    let config: ElectionConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    Ok((config, root_p.to_path_buf()))
}

fn read_ranked_ballots(
    config: &ElectionConfig,
    root_p: &Path,
    input: &Option<String>,
) -> ElectionResult<Vec<ParsedBallot>> {
    let mut data: Vec<ParsedBallot> = Vec::new();
    if let Some(input_p) = input {
        // The command line replaces the ballots of the configuration.
        let cfs = FileSource::simple_csv(input_p);
        data.append(&mut read_csv_ranking(input_p, &cfs)?);
        return Ok(data);
    }
    if let Some(js) = config.ballots.as_ref() {
        let entries: Vec<RankedEntry> =
            serde_json::from_value(js.clone()).context(ParsingJsonSnafu {})?;
        for (idx, entry) in entries.into_iter().enumerate() {
            let (choices, count) = entry.into_parts();
            data.push(ParsedBallot {
                id: format!("ballot-{:08}", idx + 1),
                count,
                choices,
            });
        }
    }
    for cfs in config.ballot_sources.iter() {
        let p: PathBuf = root_p.join(&cfs.file_path);
        let p2 = p.as_path().display().to_string();
        info!("Attempting to read rank file {:?}", p2);
        data.append(&mut read_csv_ranking(&p2, cfs)?);
    }
    Ok(data)
}

fn read_cardinal_ballots(config: &ElectionConfig, kind: BallotKind) -> ElectionResult<Ballots> {
    if !config.ballot_sources.is_empty() {
        whatever!(
            "Ballot files only contain ranked ballots, the method expects {} ballots",
            kind
        )
    }
    let js = config.ballots.clone().unwrap_or_else(|| json!([]));
    let res = match kind {
        BallotKind::Approval => {
            Ballots::Approval(serde_json::from_value(js).context(ParsingJsonSnafu {})?)
        }
        BallotKind::Scored => {
            Ballots::Scored(serde_json::from_value(js).context(ParsingJsonSnafu {})?)
        }
        BallotKind::Graded => {
            Ballots::Graded(serde_json::from_value(js).context(ParsingJsonSnafu {})?)
        }
        BallotKind::Utility => {
            Ballots::Utility(serde_json::from_value(js).context(ParsingJsonSnafu {})?)
        }
        BallotKind::Ranked => {
            whatever!("Ranked ballots are read with the ranked readers")
        }
    };
    Ok(res)
}

/// Tabulates one election and prints or writes its JSON summary.
///
/// The election is either described by a configuration file, or only given as a CSV
/// input file, in which case the candidates are the ids found on the ballots.
pub fn run_election(
    config_path: Option<String>,
    check_summary_path: Option<String>,
    out_path: Option<String>,
    overrides: &Overrides,
) -> ElectionResult<()> {
    let (config, root_p) = match (config_path, overrides.input.as_ref()) {
        (Some(p), _) => read_config(&p)?,
        (None, Some(input_p)) => (
            ElectionConfig::for_input(&simplify_file_name(input_p)),
            PathBuf::from("."),
        ),
        (None, None) => {
            whatever!("Either a configuration file or an input file must be provided")
        }
    };
    debug!("config: {:?}", config);

    let method_name: String = overrides
        .method
        .clone()
        .or_else(|| config.rules.method.clone())
        .unwrap_or_else(|| DEFAULT_METHOD.to_string());
    let method: Method = method_name.parse().context(VotingSnafu {})?;
    info!("method: {}", method);

    // Validate the rules:
    let rules = validate_rules(&config.rules, overrides.seed)?;
    let mut rng = make_rng(&config.rules, overrides.seed)?;

    if !method.uses_rules() && config.rules.tiebreak_mode.is_some() {
        warn!("{} ignores the tiebreak mode", method);
    }
    if !method.uses_rules() && config.rules.elimination_algorithm.is_some() {
        warn!("{} ignores the elimination algorithm", method);
    }

    let (ranked, cardinal): (Option<Vec<ParsedBallot>>, Option<Ballots>) =
        if method.ballot_kind() == BallotKind::Ranked {
            (Some(read_ranked_ballots(&config, &root_p, &overrides.input)?), None)
        } else {
            if overrides.input.is_some() {
                whatever!(
                    "Input files only contain ranked ballots, {} expects {} ballots",
                    method,
                    method.ballot_kind()
                )
            }
            (None, Some(read_cardinal_ballots(&config, method.ballot_kind())?))
        };

    let candidates: Vec<Candidate> = if config.candidates.is_empty() {
        match (ranked.as_deref(), cardinal.as_ref()) {
            (Some(data), _) => infer_candidates(data),
            (None, Some(ballots)) => infer_cardinal_candidates(ballots),
            (None, None) => Vec::new(),
        }
    } else {
        config
            .candidates
            .iter()
            .map(|c| {
                let name = c.name.clone().unwrap_or_else(|| c.id.clone());
                Candidate::new(c.id.clone(), name)
            })
            .collect()
    };
    if candidates.is_empty() {
        warn!("No candidate was declared or found on the ballots");
    }

    let mut builder = Builder::new(&rules)
        .context(VotingSnafu {})?
        .candidates(&candidates)
        .context(VotingSnafu {})?;
    for c in config.candidates.iter() {
        if c.excluded.unwrap_or(false) {
            builder = builder.exclude(&c.id);
        }
    }

    let result: Results = match cardinal {
        None => {
            for pb in ranked.unwrap_or_default().iter() {
                debug!("Adding ballot {:?}", pb);
                builder
                    .add_vote(&pb.choices, pb.count)
                    .context(VotingSnafu {})?;
            }
            builder.resolve(method, &mut rng).context(VotingSnafu {})?
        }
        Some(ballots) => {
            let registered = builder.registered_candidates();
            resolve(method, &registered, &ballots, builder.rules(), &mut rng)
                .context(VotingSnafu {})?
        }
    };
    info!("result: {:?}", result);

    // Assemble the final json
    let result_js = build_summary_js(&config, method, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match out_path.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some(p) => fs::write(p, &pretty_js_stats).context(WritingSummarySnafu {
            path: p.to_string(),
        })?,
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snafu::ErrorCompat;

    fn demo_path(test_name: &str, file_name: &str) -> String {
        format!("{}/demos/{}/{}", env!("CARGO_MANIFEST_DIR"), test_name, file_name)
    }

    fn test_wrapper(test_name: &str) {
        let _ = env_logger::builder().is_test(true).try_init();
        info!("Running test {}", test_name);
        let res = run_election(
            Some(demo_path(test_name, "config.json")),
            Some(demo_path(test_name, "expected_summary.json")),
            None,
            &Overrides::default(),
        );
        if let Err(e) = res.as_ref() {
            eprintln!("An error occured {}", e);
            if let Some(bt) = ErrorCompat::backtrace(e) {
                eprintln!("trace: {}", bt);
            }
        }
        assert!(res.is_ok());
    }

    #[test]
    fn irv_split() {
        test_wrapper("irv_split");
    }

    #[test]
    fn batch_excluded() {
        test_wrapper("batch_excluded");
    }

    #[test]
    fn csv_condorcet() {
        test_wrapper("csv_condorcet");
    }

    #[test]
    fn star_scores() {
        test_wrapper("star_scores");
    }

    #[test]
    fn judgment() {
        test_wrapper("judgment");
    }

    #[test]
    fn summary_written_to_file() {
        let out = std::env::temp_dir().join("choicetab_irv_split_summary.json");
        let out_s = out.display().to_string();
        run_election(
            Some(demo_path("irv_split", "config.json")),
            None,
            Some(out_s.clone()),
            &Overrides::default(),
        )
        .unwrap();
        let written = read_summary(out_s).unwrap();
        let expected = read_summary(demo_path("irv_split", "expected_summary.json")).unwrap();
        assert_eq!(written, expected);
        assert_eq!(written["winner"]["name"], json!("Clara"));
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let overrides = Overrides {
            method: Some("plurality".to_string()),
            ..Overrides::default()
        };
        let res = run_election(
            Some(demo_path("irv_split", "config.json")),
            Some(demo_path("irv_split", "expected_summary.json")),
            None,
            &overrides,
        );
        assert!(matches!(res, Err(ElectionError::Whatever { .. })));
    }

    #[test]
    fn unknown_method_is_an_error() {
        let overrides = Overrides {
            method: Some("sortition".to_string()),
            ..Overrides::default()
        };
        let res = run_election(
            Some(demo_path("irv_split", "config.json")),
            None,
            None,
            &overrides,
        );
        assert!(matches!(
            res,
            Err(ElectionError::Voting {
                source: VotingErrors::UnknownMethod(_)
            })
        ));
    }

    #[test]
    fn missing_config_is_an_error() {
        let res = run_election(
            Some(demo_path("nowhere", "config.json")),
            None,
            None,
            &Overrides::default(),
        );
        assert!(matches!(res, Err(ElectionError::OpeningJson { .. })));
        let res = run_election(None, None, None, &Overrides::default());
        assert!(matches!(res, Err(ElectionError::Whatever { .. })));
    }

    #[test]
    fn input_file_without_config() {
        let overrides = Overrides {
            method: Some("ranked_pairs".to_string()),
            seed: Some(3),
            input: Some(demo_path("csv_condorcet", "ballots.csv")),
        };
        let out = std::env::temp_dir().join("choicetab_input_only_summary.json");
        let out_s = out.display().to_string();
        run_election(None, None, Some(out_s.clone()), &overrides).unwrap();
        let written = read_summary(out_s).unwrap();
        assert_eq!(written["winner"]["id"], json!("A"));
        assert_eq!(written["config"]["contest"], json!("ballots.csv"));
        assert_eq!(written["config"]["method"], json!("ranked_pairs"));
    }

    #[test]
    fn cardinal_methods_reject_input_files() {
        let overrides = Overrides {
            method: Some("star".to_string()),
            input: Some(demo_path("csv_condorcet", "ballots.csv")),
            ..Overrides::default()
        };
        let res = run_election(None, None, None, &overrides);
        assert!(matches!(res, Err(ElectionError::Whatever { .. })));
    }

    #[test]
    fn cardinal_candidates_come_from_the_ballots() {
        let dir = std::env::temp_dir().join("choicetab_cardinal_without_candidates");
        fs::create_dir_all(&dir).unwrap();
        let config_p = dir.join("config.json");
        let config = json!({
            "outputSettings": {"contestName": "Scores only"},
            "rules": {"method": "score", "tiebreakMode": "alphabetical"},
            "ballots": [{"A": 5, "B": 3}, {"B": 4}]
        });
        fs::write(&config_p, config.to_string()).unwrap();
        let out_s = dir.join("summary.json").display().to_string();
        run_election(
            Some(config_p.display().to_string()),
            None,
            Some(out_s.clone()),
            &Overrides::default(),
        )
        .unwrap();
        let written = read_summary(out_s).unwrap();
        assert_eq!(written["winner"]["id"], json!("B"));
        assert_eq!(written["results"][0]["tally"]["A"], json!("5"));
        assert_eq!(written["results"][0]["tally"]["B"], json!("7"));
    }

    #[test]
    fn counted_ballots_are_not_expanded() {
        let dir = std::env::temp_dir().join("choicetab_large_counts");
        fs::create_dir_all(&dir).unwrap();
        let config_p = dir.join("config.json");
        let config = json!({
            "outputSettings": {"contestName": "Large counts"},
            "rules": {"method": "instant_runoff"},
            "ballots": [
                {"choices": ["A"], "count": 4_000_000_000u64},
                {"choices": ["B", "A"], "count": 3_000_000_000u64}
            ]
        });
        fs::write(&config_p, config.to_string()).unwrap();
        let out_s = dir.join("summary.json").display().to_string();
        run_election(
            Some(config_p.display().to_string()),
            None,
            Some(out_s.clone()),
            &Overrides::default(),
        )
        .unwrap();
        let written = read_summary(out_s).unwrap();
        assert_eq!(written["winner"]["id"], json!("A"));
        assert_eq!(written["results"][0]["tally"]["A"], json!("4000000000"));
    }

    #[test]
    fn rules_validation() {
        let mut rules = ElectionRules::default();
        assert_eq!(validate_rules(&rules, None).unwrap(), VoteRules::DEFAULT_RULES);

        rules.tiebreak_mode = Some("hashed".to_string());
        assert!(validate_rules(&rules, None).is_err());
        assert_eq!(
            validate_rules(&rules, Some(12)).unwrap().tiebreak_mode,
            TieBreakMode::Hashed(12)
        );
        rules.random_seed = Some(json!("7"));
        assert_eq!(
            validate_rules(&rules, None).unwrap().tiebreak_mode,
            TieBreakMode::Hashed(7)
        );

        rules.elimination_algorithm = Some("batch".to_string());
        assert_eq!(
            validate_rules(&rules, None).unwrap().elimination_algorithm,
            EliminationAlgorithm::Batch
        );
        rules.elimination_algorithm = Some("bottoms_up".to_string());
        assert!(validate_rules(&rules, None).is_err());
    }
}
