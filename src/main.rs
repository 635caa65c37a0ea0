//! Bamboo-Rust: a UCT Go engine.
//!
//! ## Usage
//!
//! - `bamboo-rust search --moves "E5 D4"` - Search a position and print the root statistics
//! - `bamboo-rust selfplay` - Let the engine play a game against itself

use std::io;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::info;

use bamboo_rust::board::{Color, parse_coord, str_coord};
use bamboo_rust::constants::{DEFAULT_PLAYOUTS, KOMI, MAX_MOVES, PASS};
use bamboo_rust::position::Position;
use bamboo_rust::scoring::score_position;
use bamboo_rust::search::{Decision, Search, SearchConfig};

/// Bamboo-Rust: a multi-threaded UCT Go engine
#[derive(Parser)]
#[command(name = "bamboo-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log more (repeat for debug output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a position given as a move list
    Search {
        /// Moves played from the empty board, alternating from Black ("pass" allowed)
        #[arg(long, default_value = "")]
        moves: String,

        #[command(flatten)]
        search: SearchArgs,
    },
    /// Play a game against itself
    Selfplay {
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Playouts per move
    #[arg(short, long, default_value_t = DEFAULT_PLAYOUTS)]
    playouts: u64,

    /// Milliseconds per move (overrides --playouts)
    #[arg(long)]
    time_ms: Option<u64>,

    /// Worker threads
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = KOMI)]
    komi: f64,
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        let config = SearchConfig::default()
            .threads(self.threads)
            .seed(self.seed)
            .komi(self.komi);
        match self.time_ms {
            Some(ms) => config.time(Duration::from_millis(ms)),
            None => config.playouts(self.playouts),
        }
    }
}

fn setup_logger(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}][{}] {}", record.target(), record.level(), message))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .context("failed to install logger")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose)?;

    match cli.command {
        Commands::Search { moves, search } => run_search(&moves, &search),
        Commands::Selfplay { search } => run_selfplay(&search),
    }
}

fn setpos(moves: &str) -> Result<Position> {
    let mut pos = Position::new();
    for token in moves.split_whitespace() {
        let pt = if token.eq_ignore_ascii_case("pass") {
            PASS
        } else {
            match parse_coord(token) {
                Some(pt) => pt,
                None => bail!("bad coordinate {token:?}"),
            }
        };
        let color = pos.to_move();
        pos.apply_move(color, pt)
            .with_context(|| format!("move {} ({token})", pos.moves() + 1))?;
    }
    Ok(pos)
}

fn run_search(moves: &str, args: &SearchArgs) -> Result<()> {
    let pos = setpos(moves)?;
    println!("{pos}");

    let config = args.config();
    let mut search = Search::new(config);
    let result = search.run(&pos);

    println!("{:>6} {:>8} {:>7} {:>7}", "move", "visits", "win%", "prior");
    for m in result.moves.iter().take(10) {
        println!(
            "{:>6} {:>8} {:>6.1}% {:>7.4}",
            str_coord(m.point),
            m.visits,
            m.win_rate * 100.0,
            m.prior
        );
    }
    println!(
        "{} playouts in {:.2}s, {} nodes",
        result.playouts,
        result.elapsed.as_secs_f64(),
        result.tree_nodes
    );
    match result.decide(&pos, search.config()) {
        Decision::Play(pt) => println!("play {}", str_coord(pt)),
        Decision::Pass => println!("pass"),
        Decision::Resign => println!("resign"),
    }
    Ok(())
}

fn run_selfplay(args: &SearchArgs) -> Result<()> {
    let mut pos = Position::new();
    let mut search = Search::new(args.config());

    while !pos.is_game_over() && pos.moves() < MAX_MOVES {
        let color = pos.to_move();
        let result = search.run(&pos);
        let pt = match result.decide(&pos, search.config()) {
            Decision::Play(pt) => pt,
            Decision::Pass => PASS,
            Decision::Resign => {
                println!("{pos}");
                println!("{} resigns", color_name(color));
                return Ok(());
            }
        };
        pos.apply_move(color, pt)
            .with_context(|| format!("engine chose an illegal move {}", str_coord(pt)))?;
        info!("move {}: {} {}", pos.moves(), color_name(color), str_coord(pt));
        println!("{}. {} {}", pos.moves(), color_name(color), str_coord(pt));
    }

    println!("{pos}");
    let score = score_position(&pos, args.komi);
    match score.winner() {
        Some(winner) => println!(
            "{} wins by {:.1}",
            color_name(winner),
            score.area_score().abs()
        ),
        None => println!("jigo"),
    }
    Ok(())
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::Black => "Black",
        Color::White => "White",
    }
}
