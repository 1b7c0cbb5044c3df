use std::io;
use std::path::PathBuf;

use backend::Backend;
use board::Color;
use clap::Parser;
use monke::MonkePlayer;
use sandbox::SandboxRules;
use widget::Config;

/// Play against a random mover at the terminal
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Read board settings from a JSON file before applying the flags below
    #[arg(long)]
    config: Option<PathBuf>,
    /// Refuse moves made before it's your turn
    #[arg(long)]
    no_premoves: bool,
    /// Keep a queue of premoves instead of a single one
    #[arg(long)]
    multi_premoves: bool,
    /// Always promote into a queen
    #[arg(long)]
    auto_queen: bool,
    #[arg(long)]
    no_animations: bool,
    /// Play as black
    #[arg(long)]
    black: bool,
    /// Start from this position instead of the usual one
    #[arg(long)]
    fen: Option<String>,
    /// Seed for the opponent's choices, for replaying a game
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> backend::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_json(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if args.no_premoves {
        config.allow_premoves = false;
    }
    if args.multi_premoves {
        config.premove.multi = true;
    }
    if args.auto_queen {
        config.promotion.auto_queen = true;
    }
    if args.no_animations {
        config.show_animations = false;
    }
    let human = if args.black { Color::Black } else { Color::White };
    config.orientation = human;

    let rules = match &args.fen {
        Some(fen) => SandboxRules::from_fen_sized(fen, config.dimensions)?,
        None => SandboxRules::new(),
    };
    let opponent = args.seed.map_or_else(MonkePlayer::new, MonkePlayer::seeded);

    let mut backend = Backend::new(rules, config, human, opponent)?;
    backend.play_game(io::stdin().lock(), io::stdout().lock())
}
