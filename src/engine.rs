use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, info};

use crate::book::OpeningBook;
use crate::config::{EngineConfig, SearchOptions, TimeBudget};
use crate::error::EngineError;
use crate::eval::{classify_phase, classify_position, Evaluator, GamePhase, PositionType};
use crate::moves::mv::Move;
use crate::ordering::OrderingTables;
use crate::position::Position;
use crate::search::stats::Stats;
use crate::search::time::{BudgetClassifier, TimeManager};
use crate::search::{iterative_deepening, NodeContext};
use crate::tt::TranspositionTable;

/// Top-level orchestrator, spec.md §6.2. Owns every piece of search-lifetime
/// state (transposition table, ordering tables, evaluator, time manager,
/// opening book) and wires them into a [`NodeContext`] for each
/// `best_move` call.
pub struct Engine {
    tt: TranspositionTable,
    ordering: OrderingTables,
    eval: Evaluator,
    time: Arc<TimeManager>,
    book: OpeningBook,
    stats: Stats,
    eval_cache_capacity: usize,
}

/// An independently owned, cheaply cloned handle that can cancel an
/// in-flight search from another thread without needing `&mut Engine`
/// (spec.md §6.2's `stop()` is inherently concurrent with `best_move`).
#[derive(Clone)]
pub struct CancelToken(Arc<TimeManager>);

impl CancelToken {
    pub fn stop(&self) {
        self.0.stop();
    }
}

fn classify<P: Position>(pos: &P, in_check: bool) -> BudgetClassifier {
    let critical = in_check || classify_position(pos) == PositionType::Tactical;
    let opening = pos.fullmove_number() <= crate::book::OPENING_BOOK_MAX_MOVES;
    let endgame = classify_phase(pos) == GamePhase::Endgame;
    BudgetClassifier { critical, opening, endgame }
}

impl Engine {
    /// Fails only on a construction-time resource problem (spec.md §7); once
    /// built, `best_move` cannot fail.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        if config.tt_capacity == 0 {
            return Err(EngineError::ZeroTtCapacity);
        }
        Ok(Self {
            tt: TranspositionTable::new(config.tt_capacity),
            ordering: OrderingTables::default(),
            eval: Evaluator::new(Some(config.eval_cache_capacity)),
            time: Arc::new(TimeManager::new()),
            book: OpeningBook::new(),
            stats: Stats::default(),
            eval_cache_capacity: config.eval_cache_capacity,
        })
    }

    /// Searches `pos` for `budget`, returning the best move found, or `None`
    /// only when `pos` has no legal move (spec.md §6.2).
    ///
    /// `opts.threads > 1` runs lazy SMP (spec.md §5): helper threads start at
    /// slightly perturbed depths with their own `Position` clone and scratch
    /// ordering/evaluation state, since those tables are plain owned structs
    /// rather than built for concurrent aliasing; the main thread (id 0)
    /// keeps using `self`'s own tables, so the common `threads == 1` case
    /// carries its history/killer/eval-cache state across calls exactly as
    /// the sequential path always did. Only the transposition table —
    /// designed in §4.2 for racy concurrent access — is actually shared.
    pub fn best_move<P>(&mut self, pos: &mut P, budget: TimeBudget, opts: SearchOptions) -> Option<Move>
    where
        P: Position + Send,
    {
        let legal = pos.legal_moves();
        if legal.is_empty() {
            self.stats = Stats::default();
            return None;
        }

        if opts.use_book {
            if let Some(m) = self.book.lookup(pos) {
                debug!("opening book hit at move {}", pos.fullmove_number());
                self.stats = Stats::default();
                return Some(m);
            }
        }

        let classifier = classify(pos, pos.is_king_attacked());
        let per_move = self.time.start_search(budget, classifier);
        self.tt.new_search();
        self.ordering.new_search();
        if opts.eval_cache_enabled {
            self.eval.new_search();
        }

        let threads = opts.threads.max(1);
        let age = self.tt.generation();
        let eval_cache_capacity = opts.eval_cache_enabled.then_some(self.eval_cache_capacity);

        let tt = &self.tt;
        let time: &TimeManager = self.time.as_ref();
        let published: Mutex<Option<Move>> = Mutex::new(None);
        let merged_stats: Mutex<Stats> = Mutex::new(Stats::default());
        let main_ordering = &mut self.ordering;
        let main_eval = &mut self.eval;

        thread::scope(|scope| {
            for id in 1..threads {
                let mut worker_pos = pos.clone();
                let mut ordering = OrderingTables::default();
                let mut eval = Evaluator::new(eval_cache_capacity);
                let merged_stats = &merged_stats;
                let max_depth = (opts.max_depth - 1).max(1);

                scope.spawn(move || {
                    let mut ctx = NodeContext {
                        tt,
                        ordering: &mut ordering,
                        eval: &mut eval,
                        time,
                        stats: Stats::default(),
                        played: Vec::new(),
                        age,
                        root_best_move: None,
                    };
                    iterative_deepening(&mut worker_pos, max_depth, per_move, &mut ctx);
                    merged_stats.lock().unwrap().merge(ctx.stats);
                });
            }

            let mut main_pos = pos.clone();
            let mut ctx = NodeContext {
                tt,
                ordering: main_ordering,
                eval: main_eval,
                time,
                stats: Stats::default(),
                played: Vec::new(),
                age,
                root_best_move: None,
            };
            let best = iterative_deepening(&mut main_pos, opts.max_depth, per_move, &mut ctx);
            merged_stats.lock().unwrap().merge(ctx.stats);
            *published.lock().unwrap() = best;
        });

        self.stats = merged_stats.into_inner().unwrap();
        info!(
            "search done: {} nodes, {:.1}% tt hit rate, sel_depth {}",
            self.stats.nodes,
            self.stats.tt_hit_rate() * 100.0,
            self.stats.sel_depth
        );

        published.into_inner().unwrap().or_else(|| legal.first().copied())
    }

    /// Asynchronous cancel, spec.md §6.2; safe to call from another thread
    /// while `best_move` is running.
    pub fn stop(&self) {
        self.time.stop();
    }

    /// A handle independent of `&Engine`'s borrow, so it can out-live the
    /// `&mut self` held by a concurrently running `best_move` call.
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken(Arc::clone(&self.time))
    }

    /// Clears the transposition table and resets ordering tables for a new
    /// game, spec.md §6.2/§6.3 (all state is process-local, reset here).
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.ordering = OrderingTables::default();
        self.eval.new_search();
        self.stats = Stats::default();
    }

    /// Statistics accumulated over the most recent `best_move` call.
    pub fn statistics(&self) -> Stats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;
    use std::time::Duration;

    #[test]
    fn returns_none_on_no_legal_moves() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        // Black to move, stalemated.
        let mut board = ChessBoard::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let budget = TimeBudget::new(Duration::from_millis(50));
        assert_eq!(engine.best_move(&mut board, budget, SearchOptions::default()), None);
    }

    #[test]
    fn leaves_position_unchanged_after_search() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let mut board = ChessBoard::starting_position();
        let before = board.clone();
        let budget = TimeBudget::new(Duration::from_millis(50));
        let opts = SearchOptions { max_depth: 4, threads: 1, use_book: false, eval_cache_enabled: true };
        let mv = engine.best_move(&mut board, budget, opts);
        assert!(mv.is_some());
        assert_eq!(board, before);
    }

    #[test]
    fn new_game_resets_statistics() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let mut board = ChessBoard::starting_position();
        let budget = TimeBudget::new(Duration::from_millis(50));
        let opts = SearchOptions { max_depth: 3, threads: 1, use_book: false, eval_cache_enabled: true };
        engine.best_move(&mut board, budget, opts);
        assert!(engine.statistics().nodes > 0);
        engine.new_game();
        assert_eq!(engine.statistics().nodes, 0);
    }

    #[test]
    fn zero_tt_capacity_is_rejected() {
        let config = EngineConfig { tt_capacity: 0, ..EngineConfig::default() };
        assert!(matches!(Engine::new(config), Err(EngineError::ZeroTtCapacity)));
    }
}
