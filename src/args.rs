use clap::Parser;

/// This is an election tabulation program: it resolves an election with one of the supported
/// voting methods and prints a JSON summary of the rounds.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election description, in JSON format.
    /// Either this option or --input must be given.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, choicetab will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A CSV file of ranked ballots: a header line, then one ballot per line with an id,
    /// a count and the choices in order. Setting this option replaces the ballots of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (method name) The voting method, for example instant_runoff, schulze_method or star.
    /// Overrides the method of the --config option. Defaults to instant_runoff.
    #[clap(short, long, value_parser)]
    pub method: Option<String>,

    /// (integer) The seed used for hashed tie breaks and for random dictatorship.
    #[clap(long, value_parser)]
    pub seed: Option<u32>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
