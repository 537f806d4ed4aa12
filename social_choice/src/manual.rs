/*!

This is the long-form manual for `social_choice` and `choicetab`.

## Methods

Each method is named by a lowercase identifier. Names are matched without regard
to case, with `-` read as `_`. The cardinal methods `approval`, `score`, `star`
and `three_two_one` also accept a `_voting` suffix (`star_voting`).

### Positional methods (ranked ballots)

| name             | points for ranks 1, 2, 3, ...        |
|------------------|--------------------------------------|
| `plurality`      | 1 for the first choice               |
| `anti_plurality` | -1 for rank m, 0 otherwise           |
| `veto`           | 1 for ranks 1 to m-1                 |
| `borda_count`    | m-1, m-2, ..., 0 for m candidates    |
| `dowdall`        | 1, 1/2, 1/3, ...                     |
| `five_three_one` | 5, 3, 1                              |

Here m is the number of candidates, and truncated ballots score nothing for
the ranks they leave blank. The highest total wins.

### Runoff methods (ranked ballots)

- `two_round_runoff`: the two leaders of the plurality count face each other.
- `instant_runoff`: the candidate with the fewest first choices is eliminated
  until one candidate holds a strict majority of the ballots still counting.
  The rules may ask for batch elimination (see [Configuration](#configuration)).
- `coombs`: same as `instant_runoff`, but the candidate ranked last most often
  is eliminated.
- `bucklin`: the first, then the first two, then the first three choices are
  counted, until a candidate holds more than half of the mentions counted in
  that round.
- `baldwin`: the lowest Borda score is eliminated, and the scores recomputed.
- `nanson`: all the candidates below the average Borda score are eliminated at
  once.

### Condorcet methods (ranked ballots)

These methods all elect the candidate who beats every other one head-to-head,
when such a candidate exists. They differ when the majorities form a cycle.

- `minimax`: the smallest worst defeat wins.
- `copeland`: one point per pairwise win, minus one per pairwise loss.
- `black_rule`: the Condorcet winner, or else the Borda winner.
- `smith_irv`: instant runoff restricted to the Smith set.
- `ranked_pairs`: the pairwise wins are locked from the largest margin down,
  skipping those that would create a cycle.
- `schulze_method`: the strongest beatpaths decide.
- `kemeny_young`: the ordering agreeing with the most pairwise preferences. It
  visits every ordering, so it refuses elections of more than 8 candidates.
- `dodgson`, `young`: the candidate closest to being a Condorcet winner.

### Cardinal methods

| name                  | ballot                        |
|-----------------------|-------------------------------|
| `approval`            | list of approved ids          |
| `score`               | id to score                   |
| `star`                | id to score                   |
| `majority_judgment`   | id to grade label             |
| `three_two_one`       | id to `good`, `ok` or `bad`   |
| `max_utility`         | id to utility                 |

`star` runs an automatic runoff between the two highest score totals: each
ballot supports the finalist it scored higher. `majority_judgment` understands
the usual grade labels (`Excellent`, `Very Good`, `Good`, `Fair`, `Poor`,
`Reject`, ...). Ballots using other labels are ranked by their descending
string order.

### Lottery

`random_dictatorship` elects the first choice of a ballot drawn at random. The
draw is reproducible when a seed is given.

## Configuration

`choicetab` reads an election description in JSON:

```text
{
  "outputSettings": {
    "contestName": "Club treasurer",
    "contestDate": "2024-03-05",
    "contestJurisdiction": "Riverside",
    "contestOffice": "Treasurer"
  },
  "candidates": [
    {"id": "A", "name": "Anna"},
    {"id": "B", "name": "Bob", "excluded": true}
  ],
  "rules": {
    "method": "instant_runoff",
    "tiebreakMode": "hashed",
    "randomSeed": 17,
    "eliminationAlgorithm": "batch"
  },
  "ballots": [["A", "B"], {"choices": ["B"], "count": 3}]
}
```

Only `outputSettings.contestName` is mandatory. When `candidates` is missing,
the candidates are the ids found on the ballots.

Rules (the tie-break mode and the elimination algorithm only matter to
`instant_runoff`, `coombs`, `baldwin`, `nanson` and `smith_irv`):
- `method` (string): defaults to `instant_runoff`.
- `tiebreakMode`: `alphabetical` (the default) or `hashed`. The hashed mode
  requires a seed and breaks the elimination ties of the runoff methods in a
  reproducible pseudo-random order.
- `randomSeed` (number or string): also seeds `random_dictatorship`.
- `eliminationAlgorithm`: `single` (the default) or `batch`.

The shape of `ballots` depends on the method. Ranked ballots are lists of ids,
or objects with `choices` and `count`. Approval ballots are lists of ids.
Score, grade and utility ballots are objects mapping ids to values:

```text
"ballots": [{"A": 5, "B": 3}, {"C": 2}]
```

### CSV files

Ranked ballots can also be read from CSV files, listed under `ballotSources`:

```text
"ballotSources": [{
  "filePath": "ballots.csv",
  "firstVoteColumnIndex": 3,
  "firstVoteRowIndex": 2,
  "idColumnIndex": 1,
  "countColumnIndex": "B"
}]
```

The paths are relative to the configuration file. All the indexes start at 1,
and the columns can also be given with spreadsheet letters. The `id` and
`count` columns are optional: without them, ids are made from the file name and
every line counts once. Blank cells are skipped.

```text
id,count,choice 1,choice 2,choice 3
b1,2,A,B,C
b2,1,B,A,
```

The `--input` command line option reads a file with exactly this layout, and
replaces the ballots of the configuration.

## Output

The summary lists the rounds of the method. Each round has the tally of every
candidate still running (as strings), and the candidates eliminated in that
round. The last round also names the elected candidate.

Most methods report a single round. The runoff methods report one round per
elimination, or per widening of the window for `bucklin`. `two_round_runoff`
reports two rounds unless the first one gives a majority. `star` reports its
scoring round and its runoff (only the first with a lone candidate), and
`three_two_one` its three stages.

 */
