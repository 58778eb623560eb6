mod cmd;
mod import;
mod tax;
mod transaction;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "cryptotax",
    version,
    about = "FIFO/LIFO cost basis and capital gains calculator for crypto trades"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate capital gains and print a summary report
    Report(cmd::report::ReportCommand),
    /// Export realized gains as a Form 8949 style text document
    Form8949(cmd::form8949::Form8949Command),
    /// Print a sample transactions CSV
    Sample(cmd::sample::SampleCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Report(cmd) => cmd.exec(),
        Command::Form8949(cmd) => cmd.exec(),
        Command::Sample(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
