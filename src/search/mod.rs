pub mod quiescence;
pub mod see;
pub mod stats;
pub mod time;

use std::time::{Duration, Instant};

use crate::eval::{Evaluator, MATE, MATE_THRESHOLD};
use crate::moves::movelist::MoveList;
use crate::moves::mv::Move;
use crate::ordering::{is_quiet, score_all, OrderingTables};
use crate::position::Position;
use crate::tt::{NodeType, TranspositionTable};
use crate::types::{Color, PieceKind, Square};

use self::quiescence::quiescence;
use self::stats::Stats;
use self::time::TimeManager;

/// Depth quiescence is bounded below by, per spec.md §4.4.3.
pub const QMAX_DEPTH: i32 = 8;
/// Plies the killer table and move stack are sized for.
pub const MAX_PLY: usize = 128;

const MAX_ASPIRATION_ATTEMPTS: i32 = 3;
const ASPIRATION_BASE_WINDOW: i32 = 50;

const MAX_EXTENSION: i32 = 2;

const LMR_SKIP_MOVES: usize = 3;
const LMR_MIN_DEPTH: i32 = 3;
/// Move-index and depth thresholds in the LMR formula of spec.md §4.4.2.
/// The spec names these constants without pinning numeric values (an Open
/// Question per DESIGN.md); these are conventional values for a classical
/// (non-NNUE) search of this depth range.
const LMR_AGGRESSIVE_THRESHOLD: i32 = 6;
const LMR_DEPTH_THRESHOLD: i32 = 6;
const LMR_MAX_REDUCTION: i32 = 4;

const LMP_MAX_DEPTH: i32 = 8;

const REVERSE_FUTILITY_DEPTH: i32 = 3;
const REVERSE_FUTILITY_MARGIN: i32 = 1200;
const RAZOR_DEPTH: i32 = 2;
const RAZOR_MARGIN: i32 = 800;
const NULL_MOVE_MIN_DEPTH: i32 = 3;
const NULL_MOVE_REDUCTION: i32 = 3;
const FUTILITY_MAX_DEPTH: i32 = 6;
const FUTILITY_MARGINS: [i32; 7] = [0, 200, 300, 500, 800, 1200, 1700];

/// Per-search mutable state threaded through every node: the shared
/// transposition table and ordering tables, the evaluator, the cooperative
/// time manager, accumulated statistics, and the move stack used to look up
/// countermove/followup replies. One instance lives for the duration of a
/// single `Engine::best_move` call (spec.md §3's "search stack frames"
/// lifecycle — the context itself is the frame's shared backbone, individual
/// recursive calls never escape).
pub struct NodeContext<'a> {
    pub tt: &'a TranspositionTable,
    pub ordering: &'a mut OrderingTables,
    pub eval: &'a mut Evaluator,
    pub time: &'a TimeManager,
    pub stats: Stats,
    pub played: Vec<Move>,
    pub age: u8,
    pub root_best_move: Option<Move>,
}

fn lmp_threshold(depth: i32) -> i32 {
    3 + depth * depth
}

fn opponent_last_move(ctx: &NodeContext<'_>, ply: u32) -> Option<Move> {
    let ply = ply as usize;
    if ply == 0 {
        None
    } else {
        ctx.played.get(ply - 1).copied()
    }
}

fn our_second_last_move(ctx: &NodeContext<'_>, ply: u32) -> Option<Move> {
    let ply = ply as usize;
    if ply < 2 {
        None
    } else {
        ctx.played.get(ply - 2).copied()
    }
}

fn has_non_pawn_material<P: Position>(pos: &P, color: Color) -> bool {
    Square::iter().any(|sq| {
        matches!(pos.piece_at(sq), Some((c, pk)) if c == color
            && matches!(pk, PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen))
    })
}

fn lmr_reduction(i: usize, depth: i32, quiet: bool, gives_check: bool, m: Move, is_pv: bool) -> i32 {
    let important = !quiet || m.promotion().is_some() || gives_check || m.is_castle();
    if i <= LMR_SKIP_MOVES || depth <= LMR_MIN_DEPTH || important {
        return 0;
    }
    let mut r = 1
        + (i as i32 - LMR_AGGRESSIVE_THRESHOLD).max(0) / 4
        + (depth - LMR_DEPTH_THRESHOLD).max(0) / 3;
    if is_pv {
        r -= 1;
    }
    r.clamp(0, LMR_MAX_REDUCTION)
}

/// Negamax with PVS, the full pruning/reduction suite, and a transposition
/// table, per spec.md §4.4.2. `ply == 0` is the search root; the chosen move
/// there is reported through `ctx.root_best_move` since the function itself
/// only returns a score.
#[allow(clippy::too_many_arguments)]
pub fn negamax<P: Position>(
    pos: &mut P,
    mut depth: i32,
    mut alpha: i32,
    mut beta: i32,
    ply: u32,
    is_pv: bool,
    null_allowed: bool,
    ctx: &mut NodeContext<'_>,
) -> i32 {
    ctx.stats.nodes += 1;
    ctx.stats.sel_depth = ctx.stats.sel_depth.max(ply as i32);

    if ctx.time.should_stop() {
        return ctx.eval.evaluate(pos, ply);
    }

    if ply > 0 && pos.is_draw() {
        return 0;
    }

    let hash = pos.zobrist_hash();
    ctx.tt.prefetch(hash);
    let tt_entry = ctx.tt.probe(hash);
    ctx.stats.tt_probes += 1;
    let mut tt_move = None;
    if let Some(e) = tt_entry {
        ctx.stats.tt_hits += 1;
        tt_move = e.best_move;
        if i32::from(e.depth) >= depth {
            match e.node_type {
                NodeType::Exact => return e.score,
                NodeType::LowerBound => {
                    if e.score >= beta {
                        return e.score;
                    }
                    alpha = alpha.max(e.score);
                }
                NodeType::UpperBound => {
                    if e.score <= alpha {
                        return e.score;
                    }
                    beta = beta.min(e.score);
                }
            }
            if alpha >= beta {
                return alpha;
            }
        }
    }

    if depth <= 0 {
        return quiescence(pos, alpha, beta, 0, ply, ctx);
    }

    let in_check = pos.is_king_attacked();
    let static_eval = ctx.eval.evaluate(pos, ply);
    ctx.ordering.record_evaluation();

    if !in_check && depth <= REVERSE_FUTILITY_DEPTH && static_eval >= beta + REVERSE_FUTILITY_MARGIN {
        ctx.stats.reverse_futility_prunes += 1;
        return beta;
    }

    if !in_check && depth <= RAZOR_DEPTH && static_eval + RAZOR_MARGIN < alpha {
        let q = quiescence(pos, alpha, beta, 0, ply, ctx);
        if q < alpha {
            ctx.stats.razor_prunes += 1;
            return q;
        }
    }

    if null_allowed
        && !in_check
        && depth >= NULL_MOVE_MIN_DEPTH
        && has_non_pawn_material(pos, pos.side_to_move())
    {
        pos.do_null_move();
        ctx.played.push(Move::NULL);
        let score = -negamax(pos, depth - 1 - NULL_MOVE_REDUCTION, -beta, -beta + 1, ply + 1, false, false, ctx);
        ctx.played.pop();
        pos.undo_null_move();
        if score >= beta {
            ctx.stats.null_move_prunes += 1;
            return beta;
        }
    }

    let legal = pos.legal_moves();
    if legal.is_empty() {
        return if in_check { -(MATE - ply as i32) } else { 0 };
    }

    let mut move_list = MoveList::default();
    for m in legal {
        move_list.push(m);
    }
    let opp_last = opponent_last_move(ctx, ply);
    let our_prev = our_second_last_move(ctx, ply);
    score_all(ctx.ordering, pos, &mut move_list, ply as usize, tt_move, opp_last, our_prev);

    let original_alpha = alpha;
    let mut best_score = -MATE;
    let mut best_move = None;

    let mut i = 0usize;
    while i < move_list.len() {
        let entry = move_list.pick_move(i);
        let m = entry.m;
        let quiet = is_quiet(pos, m);

        if depth <= LMP_MAX_DEPTH
            && i as i32 > lmp_threshold(depth)
            && alpha.abs() < MATE_THRESHOLD
            && beta.abs() < MATE_THRESHOLD
        {
            ctx.stats.late_move_prunes += 1;
            break;
        }

        // i > 0 guards that at least one move (the hash/TT move, ordered
        // first) is always fully searched — without it, a quiet-only move
        // list at a low static eval can futility-prune every move, leaving
        // best_move = None and storing a spurious mate-distance UpperBound.
        if i > 0 && quiet && !in_check && depth >= 1 && depth <= FUTILITY_MAX_DEPTH {
            let margin = FUTILITY_MARGINS[depth as usize];
            if static_eval + margin <= alpha {
                ctx.stats.futility_prunes += 1;
                i += 1;
                continue;
            }
        }

        let (_, moving_kind) = pos.piece_at(m.from()).expect("ordered move must originate from an occupied square");

        pos.do_move(m);
        let gives_check = pos.is_king_attacked();
        let mut ext = 0;
        if gives_check {
            ext += 1;
        }
        if m.promotion().is_some() {
            ext += 1;
        }
        let ext = ext.min(MAX_EXTENSION);
        let child_depth = depth - 1 + ext;

        ctx.played.push(m);
        let score = if i == 0 {
            -negamax(pos, child_depth, -beta, -alpha, ply + 1, is_pv, true, ctx)
        } else {
            let r = lmr_reduction(i, depth, quiet, gives_check, m, is_pv);
            let reduced_depth = (child_depth - r).max(0);
            let mut s = -negamax(pos, reduced_depth, -alpha - 1, -alpha, ply + 1, false, true, ctx);
            if r > 0 && s > alpha {
                s = -negamax(pos, child_depth, -alpha - 1, -alpha, ply + 1, false, true, ctx);
            }
            if s > alpha && s < beta {
                s = -negamax(pos, child_depth, -beta, -alpha, ply + 1, is_pv, true, ctx);
            }
            s
        };
        ctx.played.pop();
        pos.undo_move();

        if score > best_score {
            best_score = score;
            best_move = Some(m);
        }
        if score > alpha {
            alpha = score;
            if ply == 0 {
                ctx.root_best_move = Some(m);
            }
        }

        if alpha >= beta {
            ctx.stats.beta_cutoffs += 1;
            if quiet {
                ctx.ordering.record_cutoff(
                    pos.side_to_move(),
                    moving_kind,
                    m,
                    ply as usize,
                    depth as i8,
                    opp_last,
                    our_prev,
                );
                ctx.stats.killer_hits += 1;
            }
            ctx.tt.store(hash, Some(m), depth as i8, NodeType::LowerBound, alpha, ctx.age);
            return alpha;
        }

        if quiet {
            ctx.ordering.record_tried_quiet(pos.side_to_move(), m);
        }

        i += 1;
    }

    let node_type = if best_score > original_alpha { NodeType::Exact } else { NodeType::UpperBound };
    ctx.tt.store(hash, best_move, depth as i8, node_type, best_score, ctx.age);

    best_score
}

/// Iterative deepening with aspiration windows, per spec.md §4.4.1. Returns
/// the best move found at the deepest iteration that completed (or was
/// interrupted mid-search but still improved `ctx.root_best_move`).
pub fn iterative_deepening<P: Position>(
    pos: &mut P,
    max_depth: i32,
    per_move_budget: Duration,
    ctx: &mut NodeContext<'_>,
) -> Option<Move> {
    let mut best_move = None;
    let mut prev_score = 0i32;

    for depth in 1..=max_depth {
        let iter_start = Instant::now();

        let score = if depth <= 1 {
            negamax(pos, depth, -MATE, MATE, 0, true, true, ctx)
        } else {
            aspiration_search(pos, depth, prev_score, ctx)
        };

        if ctx.time.should_stop() && depth > 1 {
            break;
        }

        prev_score = score;
        if let Some(m) = ctx.root_best_move {
            best_move = Some(m);
        }

        let last_ply_time = iter_start.elapsed();

        if score.abs() > MATE_THRESHOLD {
            break;
        }
        if ctx.time.predicts_next_ply_wont_finish(last_ply_time, per_move_budget) {
            break;
        }
    }

    best_move
}

fn aspiration_search<P: Position>(pos: &mut P, depth: i32, prev_score: i32, ctx: &mut NodeContext<'_>) -> i32 {
    let mut attempt = 0;
    loop {
        if attempt >= MAX_ASPIRATION_ATTEMPTS {
            return negamax(pos, depth, -MATE, MATE, 0, true, true, ctx);
        }
        let window = ASPIRATION_BASE_WINDOW << attempt;
        let alpha = prev_score.saturating_sub(window);
        let beta = prev_score.saturating_add(window);
        let score = negamax(pos, depth, alpha, beta, 0, true, true, ctx);
        if ctx.time.should_stop() {
            return score;
        }
        if score <= alpha || score >= beta {
            attempt += 1;
            continue;
        }
        return score;
    }
}
