pub mod chess_board;
pub mod fen;
pub mod zobrist;

pub use chess_board::ChessBoard;
