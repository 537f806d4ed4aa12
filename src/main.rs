mod args;
mod election;

use clap::Parser;
use log::info;
use snafu::ErrorCompat;

use crate::args::Args;
use crate::election::{run_election, Overrides};

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args: {:?}", args);

    let overrides = Overrides {
        method: args.method.clone(),
        seed: args.seed,
        input: args.input.clone(),
    };
    let res = run_election(
        args.config.clone(),
        args.reference.clone(),
        args.out.clone(),
        &overrides,
    );

    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("{}", bt);
        }
        std::process::exit(1);
    }
}
