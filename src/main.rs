use clap::Parser;
use stg_stddev::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
