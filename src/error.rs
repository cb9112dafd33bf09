use thiserror::Error;

/// Failures that can occur at `Engine::new` construction time. The search
/// itself is happy-path-or-cancel (spec.md §7): once a search is running,
/// the only "error" outcome is cancellation, which is not modeled as a
/// `Result` at all — `Engine::best_move` always returns `Option<Move>`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transposition table capacity must be non-zero")]
    ZeroTtCapacity,

    #[error("requested {requested} threads but the host reports {available} available")]
    TooManyThreads { requested: usize, available: usize },
}
