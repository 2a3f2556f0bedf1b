//! Command-line tool that prints random URL-safe canary tokens.

use clap::Parser;
use kanariya_sign::generate_token;

#[derive(Parser)]
#[command(name = "kanariya-gen-token")]
#[command(about = "Generate URL-safe random tokens")]
struct Cli {
    /// Random bytes per token (floor 8)
    #[arg(long, default_value_t = 24)]
    bytes: usize,

    /// How many tokens to generate
    #[arg(long, default_value_t = 1)]
    count: usize,
}

fn main() {
    let cli = Cli::parse();

    for _ in 0..cli.count.max(1) {
        println!("{}", generate_token(cli.bytes));
    }
}
