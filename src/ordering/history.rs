use crate::types::{Color, PieceKind, Square};

pub const MAX_HISTORY: i32 = 16_384;
const HISTORY_AGING_THRESHOLD: i32 = MAX_HISTORY - 512;

/// `history[color][from][to]`, the plain quiet-move history of spec.md §3.
pub struct HistoryTable {
    scores: Box<[[[i32; 64]; 64]; 2]>,
    /// Every searched quiet move, cutoff or not, bumps this; used for
    /// relative history scoring.
    butterfly: Box<[[[u32; 64]; 64]; 2]>,
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self { scores: Box::new([[[0; 64]; 64]; 2]), butterfly: Box::new([[[0; 64]; 64]; 2]) }
    }
}

impl HistoryTable {
    pub fn score(&self, color: Color, from: Square, to: Square) -> i32 {
        self.scores[color.idx()][from.idx()][to.idx()]
    }

    pub fn butterfly(&self, color: Color, from: Square, to: Square) -> u32 {
        self.butterfly[color.idx()][from.idx()][to.idx()]
    }

    pub fn relative(&self, color: Color, from: Square, to: Square) -> i32 {
        let b = self.butterfly(color, from, to);
        if b == 0 {
            0
        } else {
            (1024 * self.score(color, from, to)) / b as i32
        }
    }

    /// Called for the cutoff move: `history += depth^2 + depth`, capped.
    /// Returns whether the updated slot crossed `HISTORY_AGING_THRESHOLD`,
    /// which the caller uses to trigger aging across every history-family
    /// table (spec.md §4.3's Updates), not just this one.
    pub fn record_cutoff(&mut self, color: Color, from: Square, to: Square, depth: i8) -> bool {
        let d = i32::from(depth);
        let bonus = d * d + d;
        let slot = &mut self.scores[color.idx()][from.idx()][to.idx()];
        *slot = (*slot + bonus).min(MAX_HISTORY);
        *slot > HISTORY_AGING_THRESHOLD
    }

    /// Called for every quiet move that was searched but did not cause the
    /// cutoff, so relative history can discount moves that are tried often
    /// but rarely succeed.
    pub fn record_tried(&mut self, color: Color, from: Square, to: Square) {
        self.butterfly[color.idx()][from.idx()][to.idx()] += 1;
    }

    pub fn age_all(&mut self) {
        for color in self.scores.iter_mut() {
            for row in color.iter_mut() {
                for v in row.iter_mut() {
                    *v /= 2;
                }
            }
        }
    }
}

/// `piece_history[color][piece_kind][from][to]`.
pub struct PieceHistoryTable {
    scores: Box<[[[[i32; 64]; 64]; 6]; 2]>,
}

impl Default for PieceHistoryTable {
    fn default() -> Self {
        Self { scores: Box::new([[[[0; 64]; 64]; 6]; 2]) }
    }
}

impl PieceHistoryTable {
    pub fn score(&self, color: Color, piece: PieceKind, from: Square, to: Square) -> i32 {
        self.scores[color.idx()][piece.idx()][from.idx()][to.idx()]
    }

    pub fn record_cutoff(&mut self, color: Color, piece: PieceKind, from: Square, to: Square, depth: i8) {
        let d = i32::from(depth);
        let bonus = d * d + d;
        let slot = &mut self.scores[color.idx()][piece.idx()][from.idx()][to.idx()];
        *slot = (*slot + bonus).min(MAX_HISTORY);
    }

    pub fn age_all(&mut self) {
        for color in self.scores.iter_mut() {
            for piece in color.iter_mut() {
                for row in piece.iter_mut() {
                    for v in row.iter_mut() {
                        *v /= 2;
                    }
                }
            }
        }
    }
}

/// `threat[color][from][to]`: bumped whenever a move targets a square the
/// opponent's last move attacked into, per spec.md §4.3's Threat component.
pub struct ThreatTable {
    scores: Box<[[[i32; 64]; 64]; 2]>,
}

impl Default for ThreatTable {
    fn default() -> Self {
        Self { scores: Box::new([[[0; 64]; 64]; 2]) }
    }
}

impl ThreatTable {
    pub fn score(&self, color: Color, from: Square, to: Square) -> i32 {
        self.scores[color.idx()][from.idx()][to.idx()]
    }

    pub fn bump(&mut self, color: Color, from: Square, to: Square, amount: i32) {
        let slot = &mut self.scores[color.idx()][from.idx()][to.idx()];
        *slot = (*slot + amount).min(MAX_HISTORY);
    }

    pub fn age_all(&mut self) {
        for color in self.scores.iter_mut() {
            for row in color.iter_mut() {
                for v in row.iter_mut() {
                    *v /= 2;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_adds_depth_squared_plus_depth() {
        let mut t = HistoryTable::default();
        t.record_cutoff(Color::White, Square(8), Square(16), 4);
        assert_eq!(t.score(Color::White, Square(8), Square(16)), 20);
    }

    #[test]
    fn history_never_exceeds_cap() {
        let mut t = HistoryTable::default();
        for _ in 0..1000 {
            t.record_cutoff(Color::White, Square(1), Square(2), 20);
        }
        assert!(t.score(Color::White, Square(1), Square(2)) <= MAX_HISTORY);
    }

    #[test]
    fn relative_history_is_zero_with_no_tries() {
        let t = HistoryTable::default();
        assert_eq!(t.relative(Color::Black, Square(4), Square(5)), 0);
    }

    #[test]
    fn record_cutoff_reports_when_the_aging_threshold_is_crossed() {
        let mut t = HistoryTable::default();
        let mut crossed = false;
        for _ in 0..1000 {
            crossed = t.record_cutoff(Color::White, Square(1), Square(2), 20);
            if crossed {
                break;
            }
        }
        assert!(crossed);
    }

    #[test]
    fn threat_table_bump_is_capped_like_history() {
        let mut t = ThreatTable::default();
        for _ in 0..1000 {
            t.bump(Color::White, Square(8), Square(16), 420);
        }
        assert!(t.score(Color::White, Square(8), Square(16)) <= MAX_HISTORY);
    }
}
