use crate::position::Position;
use crate::types::{Bitboard, Color, PieceKind, Square};

fn pawn_bitboard<P: Position>(pos: &P, color: Color) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for sq in Square::iter() {
        if pos.piece_at(sq) == Some((color, PieceKind::Pawn)) {
            bb.set(sq);
        }
    }
    bb
}

fn adjacent_files_mask(file: u8) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    if file > 0 {
        mask |= Bitboard::file_mask(file - 1);
    }
    if file < 7 {
        mask |= Bitboard::file_mask(file + 1);
    }
    mask
}

fn forward_mask(color: Color, rank: u8) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    match color {
        Color::White => {
            for r in (rank + 1)..8 {
                mask |= Bitboard::rank_mask(r);
            }
        }
        Color::Black => {
            for r in 0..rank {
                mask |= Bitboard::rank_mask(r);
            }
        }
    }
    mask
}

/// Sums every named pawn-structure bonus/penalty from white's perspective.
/// Endgame/non-endgame weighting is applied by the caller (spec.md §4.5).
pub fn pawn_structure_score<P: Position>(pos: &P, endgame: bool) -> i32 {
    let white = pawn_bitboard(pos, Color::White);
    let black = pawn_bitboard(pos, Color::Black);
    let white_score = one_side_pawn_score(pos, Color::White, white, black);
    let black_score = one_side_pawn_score(pos, Color::Black, black, white);
    let diff = white_score - black_score;
    if endgame { (diff as f64 * 1.8) as i32 } else { (diff as f64 * 1.2) as i32 }
}

fn one_side_pawn_score<P: Position>(pos: &P, color: Color, own: Bitboard, enemy: Bitboard) -> i32 {
    let mut score = 0;

    for file in 0..8u8 {
        let on_file = (own & Bitboard::file_mask(file)).count();
        if on_file > 1 {
            score -= 25 * (on_file as i32 - 1);
        }
        if on_file > 0 && (own & adjacent_files_mask(file)).is_empty() {
            score -= 20 * on_file as i32;
        }
    }

    let mut occupied_files = [false; 8];
    for sq in own.iter() {
        occupied_files[sq.file() as usize] = true;

        if sq.file() == 0 || sq.file() == 7 {
            score -= 8;
        }
        if sq.file() == 3 || sq.file() == 4 {
            score += 10;
        }

        let ahead = forward_mask(color, sq.rank());
        let blockers = (enemy & adjacent_files_mask(sq.file())) | (enemy & Bitboard::file_mask(sq.file()));
        if (blockers & ahead).is_empty() {
            let advance = match color {
                Color::White => sq.rank() as i32,
                Color::Black => 7 - sq.rank() as i32,
            };
            score += 40 + 5 * advance;
            if is_defended_by_pawn(sq, color, own) {
                score += 10;
            }
        }

        if is_defended_by_pawn(sq, color, own) {
            score += 20; // pawn chain
            score += 15; // connected
        }

        if has_lever(pos, sq, color) {
            score += 12;
        }

        let advance = match color {
            Color::White => sq.rank() as i32,
            Color::Black => 7 - sq.rank() as i32,
        };
        score += 3 * advance;

        if is_backward(sq, color, own, enemy) {
            score -= 18;
        }

        let storm_rank_ok = match color {
            Color::White => sq.rank() >= 4,
            Color::Black => sq.rank() <= 3,
        };
        if storm_rank_ok && enemy_king_on_flank(pos, color, sq) {
            score += 25;
        }
    }

    let islands = count_islands(&occupied_files);
    if islands > 1 {
        score -= 15 * (islands as i32 - 1);
    }

    score
}

fn is_defended_by_pawn(sq: Square, color: Color, own: Bitboard) -> bool {
    let behind_rank = match color {
        Color::White => sq.rank().checked_sub(1),
        Color::Black => {
            if sq.rank() < 7 {
                Some(sq.rank() + 1)
            } else {
                None
            }
        }
    };
    let Some(r) = behind_rank else { return false };
    for df in [-1i32, 1] {
        let f = sq.file() as i32 + df;
        if (0..8).contains(&f) {
            let candidate = Square((r * 8 + f as u8) & 63);
            if r < 8 && own.contains(candidate) {
                return true;
            }
        }
    }
    false
}

fn has_lever<P: Position>(pos: &P, sq: Square, color: Color) -> bool {
    let fwd_rank = match color {
        Color::White => sq.rank().checked_add(1),
        Color::Black => sq.rank().checked_sub(1),
    };
    let Some(r) = fwd_rank else { return false };
    if r > 7 {
        return false;
    }
    for df in [-1i32, 1] {
        let f = sq.file() as i32 + df;
        if (0..8).contains(&f) {
            let target = Square(r * 8 + f as u8);
            if let Some((c, PieceKind::Pawn)) = pos.piece_at(target) {
                if c != color {
                    return true;
                }
            }
        }
    }
    false
}

fn is_backward(sq: Square, color: Color, own: Bitboard, enemy: Bitboard) -> bool {
    if is_defended_by_pawn(sq, color, own) {
        return false;
    }
    let stop_rank = match color {
        Color::White => sq.rank() + 1,
        Color::Black => sq.rank().wrapping_sub(1),
    };
    if stop_rank > 7 {
        return false;
    }
    let stop_sq = Square(stop_rank * 8 + sq.file());
    let attackers_of_stop = pawn_attackers_of(stop_sq, !color, enemy);
    !attackers_of_stop.is_empty() && !is_defended_by_pawn(sq, color, own)
}

fn pawn_attackers_of(sq: Square, attacker_color: Color, attacker_pawns: Bitboard) -> Bitboard {
    let mut result = Bitboard::EMPTY;
    let behind_rank = match attacker_color {
        Color::White => sq.rank().checked_sub(1),
        Color::Black => if sq.rank() < 7 { Some(sq.rank() + 1) } else { None },
    };
    let Some(r) = behind_rank else { return result };
    for df in [-1i32, 1] {
        let f = sq.file() as i32 + df;
        if (0..8).contains(&f) {
            let candidate = Square(r * 8 + f as u8);
            if attacker_pawns.contains(candidate) {
                result.set(candidate);
            }
        }
    }
    result
}

fn enemy_king_on_flank<P: Position>(pos: &P, color: Color, sq: Square) -> bool {
    let king_sq = Square::iter().find(|&s| pos.piece_at(s) == Some((!color, PieceKind::King)));
    king_sq.is_some_and(|k| k.file().abs_diff(sq.file()) <= 1)
}

fn count_islands(occupied_files: &[bool; 8]) -> u32 {
    let mut islands = 0;
    let mut in_island = false;
    for &occ in occupied_files {
        if occ && !in_island {
            islands += 1;
            in_island = true;
        } else if !occ {
            in_island = false;
        }
    }
    islands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;

    #[test]
    fn starting_position_pawn_structure_is_symmetric() {
        let board = ChessBoard::starting_position();
        assert_eq!(pawn_structure_score(&board, false), 0);
    }

    #[test]
    fn doubled_pawns_are_penalized() {
        let board =
            ChessBoard::from_fen("4k3/8/8/8/8/4P3/4P3/4K3 w - - 0 1").unwrap();
        assert!(pawn_structure_score(&board, false) < 0);
    }
}
