use std::ops::AddAssign;

/// Counters for one cache or a sum over several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Caches created so far.
    pub caches: usize,
    /// Caches currently holding a built map.
    pub built: usize,
    /// Full rebuilds performed, including ones later invalidated.
    pub build_count: usize,
    pub key_count: usize,
    pub file_count: usize,
}

impl AddAssign for CacheStats {
    fn add_assign(&mut self, other: Self) {
        self.caches += other.caches;
        self.built += other.built;
        self.build_count += other.build_count;
        self.key_count += other.key_count;
        self.file_count += other.file_count;
    }
}

impl std::iter::Sum for CacheStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut total = CacheStats::default();
        for stats in iter {
            total += stats;
        }
        total
    }
}
