use std::env;
use std::time::Duration;

use talon::board::ChessBoard;
use talon::{Engine, EngineConfig, SearchOptions, TimeBudget};

/// Thin CLI: `talon [fen] [move_time_ms]`. Searches the given position (the
/// standard start position if omitted) and prints the chosen move and a
/// one-line statistics summary. Not the deliverable — `Engine` is.
fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let fen = args.next();
    let move_time_ms: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(3000);

    let mut board = match fen {
        Some(fen) => ChessBoard::from_fen(&fen).unwrap_or_else(|e| {
            eprintln!("invalid FEN ({e}), using the starting position");
            ChessBoard::starting_position()
        }),
        None => ChessBoard::starting_position(),
    };

    let mut engine = Engine::new(EngineConfig::default()).expect("default config is valid");
    let budget = TimeBudget::new(Duration::from_millis(move_time_ms));

    match engine.best_move(&mut board, budget, SearchOptions::default()) {
        Some(m) => {
            let stats = engine.statistics();
            println!("bestmove {}", m.to_uci());
            println!(
                "nodes {} qnodes {} seldepth {} tt_hit_rate {:.1}%",
                stats.nodes,
                stats.qnodes,
                stats.sel_depth,
                stats.tt_hit_rate() * 100.0
            );
        }
        None => println!("no legal move"),
    }
}
