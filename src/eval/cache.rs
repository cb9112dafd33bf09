use std::time::{Duration, Instant};

const EXPIRY: Duration = Duration::from_secs(60);
const LOAD_FACTOR_THRESHOLD: f64 = 0.9;
const EVICT_FRACTION: f64 = 0.25;

#[derive(Clone, Copy)]
struct Slot {
    key: u64,
    score: i32,
    inserted_at: Instant,
    occupied: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Zobrist-keyed evaluation cache with time-bucket expiry, per spec.md
/// §4.5. One instance per search thread — see the transposition table for
/// the shared, lock-free analogue; a static evaluation score is cheap
/// enough that duplicating the cache per thread avoids any synchronization.
pub struct EvalCache {
    slots: Box<[Slot]>,
    stats: CacheStats,
}

impl EvalCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![
                Slot { key: 0, score: 0, inserted_at: Instant::now(), occupied: false };
                capacity
            ]
            .into_boxed_slice(),
            stats: CacheStats::default(),
        }
    }

    fn index(&self, key: u64) -> usize {
        (key as usize) % self.slots.len()
    }

    pub fn get(&mut self, key: u64) -> Option<i32> {
        let idx = self.index(key);
        let slot = self.slots[idx];
        if slot.occupied && slot.key == key && slot.inserted_at.elapsed() < EXPIRY {
            self.stats.hits += 1;
            Some(slot.score)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    pub fn insert(&mut self, key: u64, score: i32) {
        self.sweep_expired();
        if self.load_factor() > LOAD_FACTOR_THRESHOLD {
            self.evict_oldest_fraction(EVICT_FRACTION);
        }
        let idx = self.index(key);
        self.slots[idx] = Slot { key, score, inserted_at: Instant::now(), occupied: true };
    }

    fn sweep_expired(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.occupied && slot.inserted_at.elapsed() >= EXPIRY {
                slot.occupied = false;
            }
        }
    }

    fn evict_oldest_fraction(&mut self, fraction: f64) {
        let occupied_count = self.slots.iter().filter(|s| s.occupied).count();
        let to_evict = ((occupied_count as f64) * fraction).ceil() as usize;
        if to_evict == 0 {
            return;
        }
        let mut order: Vec<usize> =
            (0..self.slots.len()).filter(|&i| self.slots[i].occupied).collect();
        order.sort_by_key(|&i| self.slots[i].inserted_at);
        for &i in order.iter().take(to_evict) {
            self.slots[i].occupied = false;
        }
    }

    pub fn load_factor(&self) -> f64 {
        let occupied = self.slots.iter().filter(|s| s.occupied).count();
        occupied as f64 / self.slots.len() as f64
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.occupied = false;
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_on_empty_cache_counts_as_miss() {
        let mut cache = EvalCache::new(16);
        assert_eq!(cache.get(42), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn insert_then_get_is_a_hit() {
        let mut cache = EvalCache::new(16);
        cache.insert(42, 123);
        assert_eq!(cache.get(42), Some(123));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn colliding_key_is_a_miss() {
        let mut cache = EvalCache::new(1);
        cache.insert(1, 10);
        assert_eq!(cache.get(2), None);
    }

    #[test]
    fn load_factor_tracks_occupancy() {
        let mut cache = EvalCache::new(4);
        assert_eq!(cache.load_factor(), 0.0);
        cache.insert(1, 1);
        assert!(cache.load_factor() > 0.0);
    }
}
