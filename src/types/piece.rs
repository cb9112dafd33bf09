use crate::impl_index;
use strum_macros::EnumIter;

pub const NUM_PIECE_KINDS: usize = 6;

impl_index!(PieceKind);
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter)]
#[repr(u8)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Centipawn material value. King's value is only ever used for safety
    /// comparisons (attacked-piece scoring), never summed into material.
    pub const fn value(self) -> i32 {
        match self {
            Self::Pawn => 100,
            Self::Knight => 320,
            Self::Bishop => 330,
            Self::Rook => 500,
            Self::Queen => 900,
            Self::King => 20000,
        }
    }

    pub const fn idx(self) -> usize {
        self as usize
    }

    pub fn from_idx(i: usize) -> Self {
        match i {
            0 => Self::Pawn,
            1 => Self::Knight,
            2 => Self::Bishop,
            3 => Self::Rook,
            4 => Self::Queen,
            5 => Self::King,
            _ => panic!("invalid piece kind index {i}"),
        }
    }
}
