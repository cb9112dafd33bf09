use crate::moves::attack_tables::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks};
use crate::position::Position;
use crate::types::{Bitboard, Color, PieceKind, Square};

fn occupancy<P: Position>(pos: &P, color: Option<Color>) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for sq in Square::iter() {
        if let Some((c, _)) = pos.piece_at(sq) {
            if color.map_or(true, |wanted| wanted == c) {
                bb.set(sq);
            }
        }
    }
    bb
}

const CENTRE: [Square; 4] = [Square(27), Square(28), Square(35), Square(36)];

fn mobility_weight(pk: PieceKind) -> i32 {
    match pk {
        PieceKind::Knight | PieceKind::Bishop => 4,
        PieceKind::Rook => 2,
        PieceKind::Queen => 1,
        _ => 0,
    }
}

/// Piece activity: mobility, space, development, the bishop pair, knight
/// outposts, and centre occupation — white's perspective (spec.md §4.5).
pub fn activity_score<P: Position>(pos: &P) -> i32 {
    let occupied = occupancy(pos, None);
    let white = occupancy(pos, Some(Color::White));
    let black = occupancy(pos, Some(Color::Black));

    one_side_activity(pos, Color::White, occupied, white) - one_side_activity(pos, Color::Black, occupied, black)
}

fn one_side_activity<P: Position>(pos: &P, color: Color, occupied: Bitboard, own: Bitboard) -> i32 {
    let mut score = 0;
    let mut bishop_count = 0;

    for sq in Square::iter() {
        let Some((c, pk)) = pos.piece_at(sq) else { continue };
        if c != color {
            continue;
        }
        let attacks = match pk {
            PieceKind::Knight => knight_attacks(sq),
            PieceKind::Bishop => {
                bishop_count += 1;
                bishop_attacks(sq, occupied)
            }
            PieceKind::Rook => rook_attacks(sq, occupied),
            PieceKind::Queen => queen_attacks(sq, occupied),
            PieceKind::King => king_attacks(sq),
            PieceKind::Pawn => pawn_attacks(sq, color),
        };
        score += mobility_weight(pk) * (attacks & !own).count() as i32;

        let back_rank = if color == Color::White { 0 } else { 7 };
        if (pk == PieceKind::Knight || pk == PieceKind::Bishop) && sq.rank() != back_rank {
            score += 15;
        }

        if pk == PieceKind::Knight {
            let outpost_rank = if color == Color::White { 4..=5 } else { 2..=3 };
            if outpost_rank.contains(&sq.rank()) {
                let attacked_by_enemy_pawn = pawn_attacks(sq, color)
                    .iter()
                    .any(|s| pos.piece_at(s) == Some((!color, PieceKind::Pawn)));
                if !attacked_by_enemy_pawn {
                    score += 20;
                }
            }
        }

        if pk != PieceKind::Pawn && pk != PieceKind::King && CENTRE.contains(&sq) {
            score += 10;
        }
    }

    if bishop_count >= 2 {
        score += 30;
    }

    let ranks_3_to_6 = Bitboard::rank_mask(2) | Bitboard::rank_mask(3) | Bitboard::rank_mask(4) | Bitboard::rank_mask(5);
    score += (own & ranks_3_to_6).count() as i32 * 2;

    let _ = enemy;
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ChessBoard;

    #[test]
    fn starting_position_activity_is_symmetric() {
        let board = ChessBoard::starting_position();
        assert_eq!(activity_score(&board), 0);
    }

    #[test]
    fn developed_knight_beats_starting_position() {
        let developed =
            ChessBoard::from_fen("rnbqkb1r/pppppppp/5n2/8/8/5N2/PPPPPPPP/RNBQKB1R w KQkq - 0 1").unwrap();
        let base = ChessBoard::starting_position();
        assert!(activity_score(&developed) >= activity_score(&base));
    }
}
