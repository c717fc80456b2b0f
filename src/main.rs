use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use log::{info, LevelFilter};

use meta_tictactoe::player::{EnginePlayer, HumanPlayer, Player, RandomPlayer};
use meta_tictactoe::{Engine, EngineConfig, GameResult, GameState, PlayerMarker};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PlayerKind {
    Engine,
    Random,
    Human,
}

/// Play meta tic-tac-toe matches, or ask the engine for a single move.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Who plays X
    #[arg(short = 'x', long, value_enum, default_value_t = PlayerKind::Engine)]
    player_x: PlayerKind,

    /// Who plays O
    #[arg(short = 'o', long, value_enum, default_value_t = PlayerKind::Random)]
    player_o: PlayerKind,

    /// Number of games to play
    #[arg(short, long, default_value_t = 10)]
    games: u32,

    /// Engine configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search this deep instead of following the depth schedule
    #[arg(short, long)]
    depth: Option<u8>,

    /// Per-move time limit for the engine, in milliseconds
    #[arg(long)]
    time_limit: Option<u64>,

    /// Print the engine's move for this position and exit
    #[arg(short, long)]
    position: Option<String>,

    /// Seed for the random player
    #[arg(long)]
    seed: Option<u64>,

    /// Do not print the board after every move
    #[arg(short, long)]
    quiet: bool,

    /// Write debug logs to this file
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Increase stderr log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    setup_logger(&cli)?;

    let config = engine_config(&cli)?;

    if let Some(position) = &cli.position {
        let state: GameState = position.parse()?;
        println!("{state}");
        let result = Engine::new(config).search(&state)?;
        println!(
            "best move {} (score {}, depth {}, {} nodes)",
            result.best_move, result.score, result.depth, result.nodes
        );
        return Ok(());
    }

    let mut wins_x = 0;
    let mut wins_o = 0;
    let mut draws = 0;

    for game_number in 0..cli.games {
        let seed = cli.seed.map(|seed| seed.wrapping_add(game_number as u64));
        let player_x = make_player(cli.player_x, &config, seed);
        let player_o = make_player(cli.player_o, &config, seed.map(|seed| !seed));
        let mut game = Game::new(player_x, player_o, cli.quiet);
        match game.play()? {
            GameResult::Won(PlayerMarker::X) => wins_x += 1,
            GameResult::Won(_) => wins_o += 1,
            GameResult::Drawn => draws += 1,
        }
    }

    println!(
        "X: {} | O: {} | Draws: {}",
        wins_x.to_string().as_str().red(),
        wins_o.to_string().as_str().green(),
        draws.to_string().as_str().yellow()
    );
    Ok(())
}

/// Configuration file given on the command line, with the flag overrides
/// applied on top. A named file that cannot be read is an error.
fn engine_config(cli: &Cli) -> Result<EngineConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(depth) = cli.depth {
        config = config.with_fixed_depth(depth);
    }
    if let Some(limit) = cli.time_limit {
        config = config.with_time_limit(Duration::from_millis(limit));
    }
    config.validate()?;
    Ok(config)
}

fn setup_logger(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let stderr_level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let log_dispatcher = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}[{}][{}] {}",
            chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
            record.target(),
            record.level(),
            message
        ))
    });

    let log_dispatcher = match &cli.logfile {
        Some(log_file) => log_dispatcher.chain(
            fern::Dispatch::new()
                .level(LevelFilter::Debug.max(stderr_level))
                .chain(fern::log_file(log_file)?),
        ),
        None => log_dispatcher,
    };

    log_dispatcher
        .chain(
            fern::Dispatch::new()
                .level(stderr_level)
                .chain(io::stderr()),
        )
        .apply()?;
    Ok(())
}

fn make_player(kind: PlayerKind, config: &EngineConfig, seed: Option<u64>) -> Box<dyn Player> {
    match kind {
        PlayerKind::Engine => Box::new(EnginePlayer::new(config.clone())),
        PlayerKind::Random => Box::new(RandomPlayer::new(seed)),
        PlayerKind::Human => Box::new(HumanPlayer::stdin()),
    }
}

// ##############################
// # Game
// ##############################
struct Game {
    player_x: Box<dyn Player>,
    player_o: Box<dyn Player>,
    state: GameState,
    quiet: bool,
}

impl Game {
    fn new(player_x: Box<dyn Player>, player_o: Box<dyn Player>, quiet: bool) -> Self {
        Game {
            player_x,
            player_o,
            state: GameState::new(),
            quiet,
        }
    }

    fn play(&mut self) -> Result<GameResult, Box<dyn Error>> {
        loop {
            if !self.quiet {
                println!("{}", self.state);
            }

            if let Some(result) = self.state.winner() {
                match result {
                    GameResult::Won(player) => println!("Player {player} wins!"),
                    GameResult::Drawn => println!("{}", "It's a draw!".yellow()),
                }
                info!("final position {}", self.state.to_notation());
                return Ok(result);
            }

            let side = self.state.side_to_move();
            let current_player = match side {
                PlayerMarker::O => &mut self.player_o,
                _ => &mut self.player_x,
            };

            let chosen_move = current_player.get_move(&self.state)?;
            if !self.quiet {
                println!("Player {side} chose {chosen_move}");
            }
            self.state.play(chosen_move)?;
        }
    }
}
