use crate::moves::mv::Move;
use crate::types::Square;

/// `countermove[from][to]`: indexed by the opponent's last move, stores our
/// best reply to it, per spec.md §3.
#[derive(Default)]
pub struct CountermoveTable {
    table: Box<[[Option<Move>; 64]; 64]>,
}

/// `followup[from][to]`: indexed by our own move two plies back.
#[derive(Default)]
pub struct FollowupTable {
    table: Box<[[Option<Move>; 64]; 64]>,
}

macro_rules! indexed_move_table {
    ($ty:ident) => {
        impl $ty {
            pub fn get(&self, trigger: Move) -> Option<Move> {
                self.table[trigger.from().idx()][trigger.to().idx()]
            }

            pub fn update(&mut self, trigger: Move, reply: Move) {
                self.table[trigger.from().idx()][trigger.to().idx()] = Some(reply);
            }
        }
    };
}

indexed_move_table!(CountermoveTable);
indexed_move_table!(FollowupTable);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::mv::MoveFlag;

    #[test]
    fn countermove_round_trips() {
        let mut t = CountermoveTable::default();
        let opp = Move::new(Square(12), Square(28), MoveFlag::DoublePush);
        let reply = Move::new(Square(52), Square(36), MoveFlag::DoublePush);
        t.update(opp, reply);
        assert_eq!(t.get(opp), Some(reply));
    }

    #[test]
    fn followup_defaults_to_none() {
        let t = FollowupTable::default();
        let m = Move::new(Square(8), Square(16), MoveFlag::Normal);
        assert_eq!(t.get(m), None);
    }
}
