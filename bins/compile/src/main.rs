//! roswan-compile - multi-WAN configuration compiler.
//!
//! Reads a YAML/JSON uplink profile and prints the compiled device
//! configuration as an exportable script or JSON.

mod compile;
mod example;
mod profile;

use clap::{Parser, Subcommand};
use roswan::Result;

#[derive(Parser)]
#[command(name = "roswan-compile")]
#[command(about = "Multi-WAN configuration compiler", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a profile into device configuration
    Compile(compile::CompileArgs),

    /// Generate example profiles
    Example(example::ExampleArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Compile(args) => compile::run(args),
        Command::Example(args) => example::run(args),
    }
}
