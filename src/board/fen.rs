use crate::types::{Color, PieceKind, Square};

use super::chess_board::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, ChessBoard};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl ChessBoard {
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingField("piece placement"))?;
        let stm = fields.next().ok_or(FenError::MissingField("side to move"))?;
        let castling = fields.next().unwrap_or("-");
        let ep = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut board = ChessBoard::empty();

        let mut rank = 7i32;
        let mut file = 0i32;
        for c in placement.chars() {
            match c {
                '/' => {
                    if file != 8 {
                        return Err(FenError::BadPlacement);
                    }
                    rank -= 1;
                    file = 0;
                }
                d if d.is_ascii_digit() => {
                    file += d.to_digit(10).unwrap() as i32;
                }
                piece_char => {
                    if !(0..8).contains(&file) || !(0..8).contains(&rank) {
                        return Err(FenError::BadPlacement);
                    }
                    let (color, kind) = parse_piece(piece_char).ok_or(FenError::BadPlacement)?;
                    let sq = Square((rank * 8 + file) as u8);
                    board.put_piece(color, kind, sq);
                    file += 1;
                }
            }
        }

        board.set_side_to_move(match stm {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(FenError::BadSideToMove),
        });

        let mut rights = 0u8;
        if castling.contains('K') {
            rights |= CASTLE_WK;
        }
        if castling.contains('Q') {
            rights |= CASTLE_WQ;
        }
        if castling.contains('k') {
            rights |= CASTLE_BK;
        }
        if castling.contains('q') {
            rights |= CASTLE_BQ;
        }
        board.set_castling_rights(rights);

        board.set_en_passant(if ep == "-" { None } else { Square::from_algebraic(ep) });

        board.set_halfmove_clock(halfmove.parse().map_err(|_| FenError::BadCounter)?);
        board.set_fullmove_number(fullmove.parse().map_err(|_| FenError::BadCounter)?);

        Ok(board)
    }
}

fn parse_piece(c: char) -> Option<(Color, PieceKind)> {
    let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
    let kind = match c.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };
    Some((color, kind))
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("missing FEN field: {0}")]
    MissingField(&'static str),
    #[error("malformed piece placement field")]
    BadPlacement,
    #[error("side to move must be 'w' or 'b'")]
    BadSideToMove,
    #[error("halfmove/fullmove counters must be integers")]
    BadCounter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn starting_fen_has_white_to_move_and_full_rights() {
        let board = ChessBoard::from_fen(STARTING_FEN).unwrap();
        assert_eq!(board.side_to_move(), Color::White);
        assert_eq!(board.castling_rights(), CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ);
        assert_eq!(board.zobrist_hash(), board.recompute_hash());
    }

    #[test]
    fn en_passant_square_is_parsed() {
        let board =
            ChessBoard::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3").unwrap();
        assert_eq!(board.en_passant_file(), Some(3));
    }

    #[test]
    fn rejects_malformed_placement() {
        assert!(ChessBoard::from_fen("not-a-fen w - - 0 1").is_err());
    }
}
