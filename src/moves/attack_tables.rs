use std::sync::OnceLock;

use crate::types::{Bitboard, Color, Square};

const KNIGHT_DELTAS: [(i8, i8); 8] =
    [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_DELTAS: [(i8, i8); 8] =
    [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];

struct Tables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| {
        let mut knight = [Bitboard::EMPTY; 64];
        let mut king = [Bitboard::EMPTY; 64];
        let mut pawn = [[Bitboard::EMPTY; 64]; 2];

        for idx in 0..64u8 {
            let sq = Square(idx);
            let (file, rank) = (sq.file() as i8, sq.rank() as i8);

            for (df, dr) in KNIGHT_DELTAS {
                if let Some(s) = offset(file, rank, df, dr) {
                    knight[sq.idx()].set(s);
                }
            }
            for (df, dr) in KING_DELTAS {
                if let Some(s) = offset(file, rank, df, dr) {
                    king[sq.idx()].set(s);
                }
            }
            for (df, dr) in [(-1, 1), (1, 1)] {
                if let Some(s) = offset(file, rank, df, dr) {
                    pawn[Color::White.idx()][sq.idx()].set(s);
                }
            }
            for (df, dr) in [(-1, -1), (1, -1)] {
                if let Some(s) = offset(file, rank, df, dr) {
                    pawn[Color::Black.idx()][sq.idx()].set(s);
                }
            }
        }

        Tables { knight, king, pawn }
    })
}

fn offset(file: i8, rank: i8, df: i8, dr: i8) -> Option<Square> {
    let (nf, nr) = (file + df, rank + dr);
    if (0..8).contains(&nf) && (0..8).contains(&nr) {
        Some(Square((nr * 8 + nf) as u8))
    } else {
        None
    }
}

pub fn knight_attacks(sq: Square) -> Bitboard {
    tables().knight[sq.idx()]
}

pub fn king_attacks(sq: Square) -> Bitboard {
    tables().king[sq.idx()]
}

pub fn pawn_attacks(sq: Square, color: Color) -> Bitboard {
    tables().pawn[color.idx()][sq.idx()]
}

const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn ray_attacks(sq: Square, occupied: Bitboard, dirs: &[(i8, i8); 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    let (file, rank) = (sq.file() as i8, sq.rank() as i8);
    for &(df, dr) in dirs {
        let mut f = file;
        let mut r = rank;
        loop {
            f += df;
            r += dr;
            if !(0..8).contains(&f) || !(0..8).contains(&r) {
                break;
            }
            let s = Square((r * 8 + f) as u8);
            attacks.set(s);
            if occupied.contains(s) {
                break;
            }
        }
    }
    attacks
}

pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &BISHOP_DIRS)
}

pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &ROOK_DIRS)
}

pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_in_corner_has_two_targets() {
        assert_eq!(knight_attacks(Square(0)).count(), 2);
    }

    #[test]
    fn rook_on_empty_board_sees_whole_cross() {
        let attacks = rook_attacks(Square::from_algebraic("d4").unwrap(), Bitboard::EMPTY);
        assert_eq!(attacks.count(), 14);
    }

    #[test]
    fn blocker_stops_the_ray_but_is_included() {
        let d4 = Square::from_algebraic("d4").unwrap();
        let d6 = Square::from_algebraic("d6").unwrap();
        let mut occ = Bitboard::EMPTY;
        occ.set(d6);
        let attacks = rook_attacks(d4, occ);
        assert!(attacks.contains(d6));
        assert!(!attacks.contains(Square::from_algebraic("d7").unwrap()));
    }
}
