use std::time::Duration;

/// Base time budget `B` for the move about to be searched, plus the engine's
/// own classification of the position (spec.md §4.7). The engine derives the
/// per-move budget from these; callers only supply `base`.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    pub base: Duration,
}

impl TimeBudget {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }
}

/// Tuning knobs accepted per `Engine::best_move` call (spec.md §6.2).
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub max_depth: i32,
    pub threads: usize,
    pub use_book: bool,
    pub eval_cache_enabled: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { max_depth: 64, threads: 1, use_book: true, eval_cache_enabled: true }
    }
}

/// Construction-time configuration for `Engine::new`.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub tt_capacity: usize,
    pub eval_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { tt_capacity: 1 << 20, eval_cache_capacity: 1 << 16 }
    }
}
