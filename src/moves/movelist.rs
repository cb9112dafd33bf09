use arrayvec::ArrayVec;

use super::mv::Move;

pub const MAX_MOVES: usize = 218;

#[derive(Clone, Copy, Default)]
pub struct MoveListEntry {
    pub m: Move,
    pub score: i32,
}

#[derive(Clone, Default)]
pub struct MoveList {
    pub arr: ArrayVec<MoveListEntry, MAX_MOVES>,
}

impl MoveList {
    pub fn push(&mut self, m: Move) {
        self.arr.push(MoveListEntry { m, score: 0 });
    }

    pub fn len(&self) -> usize {
        self.arr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arr.is_empty()
    }

    /// Selection-sorts the remaining entries: finds the highest-scoring entry
    /// at or after `start`, swaps it into place, and returns it. Ties are
    /// broken by keeping the earlier element in place (stable), matching
    /// spec.md §4.3's ordering-stability invariant.
    pub fn pick_move(&mut self, start: usize) -> MoveListEntry {
        let mut best = start;
        for i in (start + 1)..self.arr.len() {
            if self.arr[i].score > self.arr[best].score {
                best = i;
            }
        }
        self.arr.swap(start, best);
        self.arr[start]
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.arr.iter().map(|e| e.m)
    }
}
