pub mod attack_tables;
pub mod movelist;
pub mod mv;

pub use mv::Move;
