use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::TimeBudget;

/// How often (in nodes) the search checks the wall clock, per spec.md §4.7.
pub const NODES_CHECK_INTERVAL: u64 = 2048;

/// Per-position classification that adjusts the base budget `B`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetClassifier {
    pub critical: bool,
    pub opening: bool,
    pub endgame: bool,
}

/// Cooperative cancellation plus a deadline, shared across lazy-SMP helper
/// threads. `stop()` latches: once set, every subsequent `should_stop` call
/// returns `true` forever until the next `start_search`, per spec.md §5's
/// cancellation semantics.
pub struct TimeManager {
    stop: AtomicBool,
    deadline: AtomicU64,
    start: AtomicU64,
    nodes_since_check: AtomicU64,
    epoch: Instant,
}

impl TimeManager {
    pub fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            deadline: AtomicU64::new(u64::MAX),
            start: AtomicU64::new(0),
            nodes_since_check: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    /// Resolves the per-move budget (spec.md §4.7's table) and resets the
    /// stop latch and node counter for a fresh search.
    pub fn start_search(&self, budget: TimeBudget, classifier: BudgetClassifier) -> Duration {
        let per_move = if classifier.critical {
            budget.base * 3
        } else if classifier.opening {
            budget.base / 2
        } else if classifier.endgame {
            budget.base + Duration::from_millis(3000)
        } else {
            budget.base
        };

        self.stop.store(false, Ordering::SeqCst);
        self.nodes_since_check.store(0, Ordering::Relaxed);
        let now = self.epoch.elapsed().as_micros() as u64;
        self.start.store(now, Ordering::SeqCst);
        self.deadline.store(now + per_move.as_micros() as u64, Ordering::SeqCst);
        per_move
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn elapsed(&self) -> Duration {
        let now = self.epoch.elapsed().as_micros() as u64;
        let start = self.start.load(Ordering::SeqCst);
        Duration::from_micros(now.saturating_sub(start))
    }

    fn deadline_passed(&self) -> bool {
        let now = self.epoch.elapsed().as_micros() as u64;
        now >= self.deadline.load(Ordering::SeqCst)
    }

    /// Cheap at every node: only touches the clock every
    /// [`NODES_CHECK_INTERVAL`] calls, matching spec.md §4.7.
    pub fn should_stop(&self) -> bool {
        if self.stop.load(Ordering::SeqCst) {
            return true;
        }
        let count = self.nodes_since_check.fetch_add(1, Ordering::Relaxed) + 1;
        if count % NODES_CHECK_INTERVAL != 0 {
            return false;
        }
        if self.deadline_passed() {
            self.stop.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Predicts whether another iterative-deepening pass can complete: if the
    /// last depth took `last_ply_time` and `1.5x` that exceeds what remains,
    /// it is not worth starting the next depth (spec.md §4.4.1).
    pub fn predicts_next_ply_wont_finish(&self, last_ply_time: Duration, per_move: Duration) -> bool {
        let remaining = per_move.saturating_sub(self.elapsed());
        last_ply_time.mul_f64(1.5) > remaining
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_latches_forever() {
        let tm = TimeManager::new();
        tm.start_search(TimeBudget::new(Duration::from_secs(10)), BudgetClassifier::default());
        assert!(!tm.should_stop());
        tm.stop();
        assert!(tm.should_stop());
        assert!(tm.should_stop());
    }

    #[test]
    fn classifier_critical_triples_budget() {
        let tm = TimeManager::new();
        let per_move = tm.start_search(
            TimeBudget::new(Duration::from_millis(100)),
            BudgetClassifier { critical: true, ..Default::default() },
        );
        assert_eq!(per_move, Duration::from_millis(300));
    }

    #[test]
    fn classifier_opening_halves_budget() {
        let tm = TimeManager::new();
        let per_move = tm.start_search(
            TimeBudget::new(Duration::from_millis(100)),
            BudgetClassifier { opening: true, ..Default::default() },
        );
        assert_eq!(per_move, Duration::from_millis(50));
    }

    #[test]
    fn an_expired_deadline_is_observed_after_the_check_interval() {
        let tm = TimeManager::new();
        tm.start_search(TimeBudget::new(Duration::from_micros(1)), BudgetClassifier::default());
        std::thread::sleep(Duration::from_millis(2));
        let mut stopped = false;
        for _ in 0..NODES_CHECK_INTERVAL {
            if tm.should_stop() {
                stopped = true;
                break;
            }
        }
        assert!(stopped);
    }
}
