use clap::Parser;
use tradereview::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
