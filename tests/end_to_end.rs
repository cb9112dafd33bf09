//! Scenario tests from spec.md §8 (S1-S6): realistic positions with a
//! pinned expected move or class of acceptable moves.

use std::time::Duration;

use talon::board::ChessBoard;
use talon::{Engine, EngineConfig, SearchOptions, TimeBudget};

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).unwrap()
}

#[test]
fn s1_opens_with_a_principled_first_move() {
    let mut e = engine();
    let mut board = ChessBoard::starting_position();
    let budget = TimeBudget::new(Duration::from_millis(500));
    let opts = SearchOptions { use_book: false, ..SearchOptions::default() };
    let m = e.best_move(&mut board, budget, opts).expect("start position always has a move");
    let uci = m.to_uci();
    assert!(
        ["e2e4", "d2d4", "g1f3", "c2c4"].contains(&uci.as_str()),
        "expected a principled opening move, got {uci}"
    );
}

#[test]
fn s2_finds_scholars_mate_in_one() {
    let mut e = engine();
    let mut board =
        ChessBoard::from_fen("rnbqkb1r/pppp1ppp/5n2/4p2Q/4P3/8/PPPP1PPP/RNB1KBNR w KQkq - 0 1").unwrap();
    let budget = TimeBudget::new(Duration::from_secs(2));
    let opts = SearchOptions { use_book: false, ..SearchOptions::default() };
    let m = e.best_move(&mut board, budget, opts).unwrap();
    assert_eq!(m.to_uci(), "h5f7");
    let stats = e.statistics();
    assert!(stats.nodes > 0);
}

#[test]
fn s3_king_and_pawn_endgame_never_loses_the_pawn() {
    let mut e = engine();
    let mut board = ChessBoard::from_fen("8/8/8/8/4P3/8/8/3K1k2 w - - 0 1").unwrap();
    let budget = TimeBudget::new(Duration::from_secs(2));
    let opts = SearchOptions { use_book: false, ..SearchOptions::default() };
    let m = e.best_move(&mut board, budget, opts).unwrap();
    assert!(
        ["d1d2", "d1e2", "e4e5"].contains(&m.to_uci().as_str()),
        "expected a pawn-preserving move, got {}",
        m.to_uci()
    );
}

#[test]
fn s4_does_not_walk_the_king_into_a_mating_net() {
    let mut e = engine();
    let mut board = ChessBoard::from_fen("6k1/5ppp/8/8/8/8/5PPP/6K1 w - - 0 1").unwrap();
    let budget = TimeBudget::new(Duration::from_secs(1));
    let opts = SearchOptions { use_book: false, ..SearchOptions::default() };
    let m = e.best_move(&mut board, budget, opts).unwrap();
    assert!(
        ["g2g3", "h2h3", "g1h1"].contains(&m.to_uci().as_str()),
        "expected a safe king-side move, got {}",
        m.to_uci()
    );
}

#[test]
fn s5_captures_a_hanging_queen() {
    let mut e = engine();
    // White knight on c4 and rook on a5 both attack a black queen sitting
    // undefended on e5.
    let mut board = ChessBoard::from_fen("4k3/8/8/R3q3/2N5/8/8/4K3 w - - 0 1").unwrap();
    let budget = TimeBudget::new(Duration::from_secs(1));
    let opts = SearchOptions { use_book: false, ..SearchOptions::default() };
    let m = e.best_move(&mut board, budget, opts).unwrap();
    assert_eq!(m.to(), talon::types::Square::from_algebraic("e5").unwrap());
}

#[test]
fn s6_stop_returns_promptly_with_a_legal_move() {
    let mut e = engine();
    let mut board = ChessBoard::starting_position();
    let budget = TimeBudget::new(Duration::from_secs(10));
    let opts = SearchOptions { use_book: false, ..SearchOptions::default() };

    let cancel = e.cancel_token();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        cancel.stop();
    });

    let start = std::time::Instant::now();
    let m = e.best_move(&mut board, budget, opts);
    stopper.join().unwrap();

    assert!(m.is_some());
    assert!(start.elapsed() < Duration::from_secs(2), "stop() did not cut the search short");
}
