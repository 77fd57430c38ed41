use clap::Parser;
use kickstart::cli::{run_cli, Cli};

fn main() {
    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
