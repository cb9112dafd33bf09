use crate::position::Position;
use crate::types::{Color, PieceKind, Square};

const CENTRE_SQUARES: [Square; 4] = [Square(27), Square(28), Square(35), Square(36)];

fn centre_distance(sq: Square) -> i32 {
    CENTRE_SQUARES.iter().map(|&c| sq.dist(c) as i32).min().unwrap_or(4)
}

fn king_square<P: Position>(pos: &P, color: Color) -> Option<Square> {
    Square::iter().find(|&sq| pos.piece_at(sq) == Some((color, PieceKind::King)))
}

fn non_king_pieces<P: Position>(pos: &P, color: Color) -> Vec<(Square, PieceKind)> {
    Square::iter()
        .filter_map(|sq| pos.piece_at(sq).and_then(|(c, pk)| (c == color && pk != PieceKind::King).then_some((sq, pk))))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndgameClass {
    KingPawn,
    RookPawn,
    Queen,
    Bishop,
    Knight,
    Mixed,
}

fn classify(white: &[(Square, PieceKind)], black: &[(Square, PieceKind)]) -> EndgameClass {
    let all: Vec<PieceKind> = white.iter().chain(black.iter()).map(|&(_, pk)| pk).collect();
    let only = |kinds: &[PieceKind]| all.iter().all(|pk| kinds.contains(pk));

    if only(&[PieceKind::Pawn]) {
        EndgameClass::KingPawn
    } else if only(&[PieceKind::Rook, PieceKind::Pawn]) {
        EndgameClass::RookPawn
    } else if only(&[PieceKind::Queen, PieceKind::Pawn]) {
        EndgameClass::Queen
    } else if only(&[PieceKind::Bishop, PieceKind::Pawn]) {
        EndgameClass::Bishop
    } else if only(&[PieceKind::Knight, PieceKind::Pawn]) {
        EndgameClass::Knight
    } else {
        EndgameClass::Mixed
    }
}

/// Has the opposition: kings face each other on the same file/rank with an
/// odd square gap, and it's the other side's move (simplified: an odd gap is
/// treated as favorable to whichever side is NOT asked to move into it).
fn has_opposition(white_king: Square, black_king: Square) -> bool {
    let same_file = white_king.file() == black_king.file();
    let same_rank = white_king.rank() == black_king.rank();
    let gap = white_king.dist(black_king);
    (same_file || same_rank) && gap % 2 == 0 && gap > 0
}

fn king_centralization_bonus(sq: Square) -> i32 {
    20 - 4 * centre_distance(sq)
}

fn passed_pawn_king_support<P: Position>(pos: &P, color: Color, own_king: Square) -> i32 {
    let mut bonus = 0;
    for sq in Square::iter() {
        if pos.piece_at(sq) != Some((color, PieceKind::Pawn)) {
            continue;
        }
        let ahead_has_enemy_pawn = Square::iter().any(|s| {
            pos.piece_at(s) == Some((!color, PieceKind::Pawn))
                && s.file().abs_diff(sq.file()) <= 1
                && match color {
                    Color::White => s.rank() > sq.rank(),
                    Color::Black => s.rank() < sq.rank(),
                }
        });
        if ahead_has_enemy_pawn {
            continue;
        }
        if own_king.dist(sq) <= 2 {
            bonus += 25;
        }
    }
    bonus
}

/// Endgame-class specialization, white's perspective: opposition, king
/// centralization, and king-escorted passed pawns, per spec.md §4.5.
pub fn endgame_score<P: Position>(pos: &P) -> i32 {
    let white_pieces = non_king_pieces(pos, Color::White);
    let black_pieces = non_king_pieces(pos, Color::Black);
    let class = classify(&white_pieces, &black_pieces);

    let Some(wk) = king_square(pos, Color::White) else { return 0 };
    let Some(bk) = king_square(pos, Color::Black) else { return 0 };

    let mut score = 0;

    if has_opposition(wk, bk) {
        score += 25;
    }

    match class {
        EndgameClass::KingPawn | EndgameClass::RookPawn | EndgameClass::Mixed => {
            score += king_centralization_bonus(wk) - king_centralization_bonus(bk);
            score += passed_pawn_king_support(pos, Color::White, wk);
            score -= passed_pawn_king_support(pos, Color::Black, bk);
        }
        EndgameClass::Queen | EndgameClass::Bishop | EndgameClass::Knight => {
            score += (king_centralization_bonus(wk) - king_centralization_bonus(bk)) / 2;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;

    #[test]
    fn symmetric_king_pawn_endgame_is_balanced() {
        let board = ChessBoard::from_fen("4k3/4p3/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(endgame_score(&board), 0);
    }

    #[test]
    fn centralized_king_beats_cornered_king_in_king_pawn_endgame() {
        let centralized = ChessBoard::from_fen("7k/8/8/3K4/8/4p3/8/8 w - - 0 1").unwrap();
        let corner = ChessBoard::from_fen("7k/8/8/8/8/4p3/8/K7 w - - 0 1").unwrap();
        assert!(endgame_score(&centralized) > endgame_score(&corner));
    }
}
