use crate::election::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

/// The header of the JSON summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub method: String,
}

/// A CSV file of ranked ballots.
///
/// The column and row indexes are 1-based. Columns may also be given with
/// spreadsheet letters ("A", "B", ..., "AA").
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    _id_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    _count_column_index: Option<JSValue>,
}

impl FileSource {
    /// The layout expected for the --input option: a header line, then an id,
    /// a count and the choices on each line.
    pub fn simple_csv(path: &str) -> FileSource {
        FileSource {
            file_path: path.to_string(),
            _first_vote_column_index: Some(JSValue::from(3)),
            _first_vote_row_index: Some(JSValue::from(2)),
            _id_column_index: Some(JSValue::from(1)),
            _count_column_index: Some(JSValue::from(2)),
        }
    }

    /// The 0-based index of the first choice.
    pub fn first_vote_column_index(&self) -> ElectionResult<usize> {
        let x = read_js_int(&self._first_vote_column_index)?;
        Ok(x - 1)
    }

    /// The 1-based index of the first ballot row. Defaults to the first row.
    pub fn first_vote_row_index(&self) -> ElectionResult<usize> {
        match self._first_vote_row_index {
            None => Ok(1),
            Some(_) => read_js_int(&self._first_vote_row_index),
        }
    }

    /// The 0-based index of the id column, if any.
    pub fn id_column_index(&self) -> ElectionResult<Option<usize>> {
        optional_column(&self._id_column_index)
    }

    /// The 0-based index of the count column, if any.
    pub fn count_column_index(&self) -> ElectionResult<Option<usize>> {
        optional_column(&self._count_column_index)
    }
}

fn optional_column(x: &Option<JSValue>) -> ElectionResult<Option<usize>> {
    match x {
        None | Some(JSValue::Null) => Ok(None),
        Some(_) => read_js_int(x).map(|i| Some(i - 1)),
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionCandidate {
    pub id: String,
    pub name: Option<String>,
    pub excluded: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElectionRules {
    pub method: Option<String>,
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<JSValue>,
    #[serde(rename = "eliminationAlgorithm")]
    pub elimination_algorithm: Option<String>,
}

impl ElectionRules {
    pub fn random_seed(&self) -> ElectionResult<Option<u32>> {
        let x: u64 = match self.random_seed.as_ref() {
            None | Some(JSValue::Null) => return Ok(None),
            Some(JSValue::Number(n)) => n.as_u64().context(ParsingJsonNumberSnafu {})?,
            Some(JSValue::String(s)) => s.trim().parse().ok().context(ParsingJsonNumberSnafu {})?,
            Some(_) => return ParsingJsonNumberSnafu {}.fail(),
        };
        match u32::try_from(x) {
            Ok(s) => Ok(Some(s)),
            Err(_) => whatever!("The random seed {} does not fit in 32 bits", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub candidates: Vec<ElectionCandidate>,
    #[serde(default)]
    pub rules: ElectionRules,
    /// Inline ballots. Their shape depends on the method.
    pub ballots: Option<JSValue>,
    #[serde(rename = "ballotSources", default)]
    pub ballot_sources: Vec<FileSource>,
}

impl ElectionConfig {
    /// The configuration of an election only described by an input file.
    pub fn for_input(name: &str) -> ElectionConfig {
        ElectionConfig {
            output_settings: OutputSettings {
                contest_name: name.to_string(),
                contest_date: None,
                contest_jurisdiction: None,
                contest_office: None,
            },
            candidates: Vec::new(),
            rules: ElectionRules::default(),
            ballots: None,
            ballot_sources: Vec::new(),
        }
    }
}

/// An inline ranked ballot: either a plain list of ids, or a list cast several times.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RankedEntry {
    Counted { choices: Vec<String>, count: u64 },
    Plain(Vec<String>),
}

impl RankedEntry {
    pub fn into_parts(self) -> (Vec<String>, u64) {
        match self {
            RankedEntry::Counted { choices, count } => (choices, count),
            RankedEntry::Plain(choices) => (choices, 1),
        }
    }
}

pub fn read_summary(path: String) -> ElectionResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    if !js["results"].is_array() {
        whatever!("The summary has no list of results")
    }
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> ElectionResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {})?,
        // Spreadsheet columns: A is 1, Z is 26, AA is 27.
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            s.to_ascii_lowercase()
                .chars()
                .try_fold(0usize, |acc, c| {
                    acc.checked_mul(26)?
                        .checked_add(c as usize - 'a' as usize + 1)
                })
                .context(ParsingJsonNumberSnafu {})?
        }
        Some(JSValue::String(s)) => s.trim().parse::<usize>().ok().context(ParsingJsonNumberSnafu {})?,
        _ => return ParsingJsonNumberSnafu {}.fail(),
    };
    if res == 0 {
        return ParsingJsonNumberSnafu {}.fail();
    }
    Ok(res)
}
