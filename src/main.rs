use anyhow::Result;
use chess_rules::console::{Console, ConsoleConfig};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chess-rules", version, about = "Play chess by typing moves such as e2e4")]
struct Args {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Only print the game status after a move, not the whole board
    #[arg(long)]
    hide_board: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, &args.log_level),
    )
    .target(env_logger::Target::Stderr)
    .init();

    let mut console = Console::new(ConsoleConfig {
        show_board: !args.hide_board,
    });
    console.run()
}
