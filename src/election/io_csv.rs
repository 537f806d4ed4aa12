// Primitives for reading CSV files.

use std::fs::File;

use crate::election::{io_common::simplify_file_name, *};

pub fn read_csv_ranking(path: &str, cfs: &FileSource) -> ElectionResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    let id_idx_o = cfs.id_column_index()?;
    let choices_start_col = cfs.first_vote_column_index()?;
    let count_idx_o = cfs.count_column_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let id = match id_idx_o {
            Some(id_idx) => line
                .get(id_idx)
                .context(CsvLineToShortSnafu { lineno })?
                .to_string(),
            None => default_id(lineno),
        };

        let count: u64 = match count_idx_o {
            Some(count_idx) => line
                .get(count_idx)
                .context(CsvLineToShortSnafu { lineno })?
                .trim()
                .parse::<u64>()
                .ok()
                .context(CsvCountSnafu { lineno })?,
            None => 1,
        };

        let choices: Vec<String> = line
            .iter()
            .skip(choices_start_col)
            .map(|s| s.to_string())
            .collect();
        debug!("read_csv_ranking: lineno: {:?} row: {:?}", lineno, &choices);

        res.push(ParsedBallot { id, count, choices });
    }
    Ok(res)
}

fn get_records(path: &str, cfs: &FileSource) -> ElectionResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    // Rows are counted from 1.
    for _ in 1..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}

fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}
