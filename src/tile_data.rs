//! The page cache supporting `TileData`'s ownership rules (spec §3
//! "Ownership", §4.8).

use std::sync::Arc;

/// The single-entry page cache used by both V2->V1 directions: a PVRZ
/// page is decoded once on first reference and reused for every
/// subsequent tile/block that addresses it (spec §4.8).
pub struct PageCache<T> {
    entry: Option<(u32, Arc<T>)>,
}

impl<T> PageCache<T> {
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// Returns the cached page if its index matches, otherwise loads,
    /// caches, and returns the new one (evicting whatever was cached).
    pub fn get_or_load(&mut self, page: u32, load: impl FnOnce(u32) -> T) -> Arc<T> {
        if let Some((cached_page, value)) = &self.entry {
            if *cached_page == page {
                return Arc::clone(value);
            }
        }
        let value = Arc::new(load(page));
        self.entry = Some((page, Arc::clone(&value)));
        value
    }
}

impl<T> Default for PageCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn repeated_access_to_same_page_loads_once() {
        let mut cache: PageCache<u32> = PageCache::new();
        let loads = AtomicUsize::new(0);
        for _ in 0..5 {
            let page = cache.get_or_load(3, |p| {
                loads.fetch_add(1, Ordering::SeqCst);
                p * 100
            });
            assert_eq!(*page, 300);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn switching_pages_evicts_the_previous_entry() {
        let mut cache: PageCache<u32> = PageCache::new();
        let first = cache.get_or_load(1, |p| p);
        let second = cache.get_or_load(2, |p| p);
        assert_eq!(*first, 1);
        assert_eq!(*second, 2);
        let first_again = cache.get_or_load(1, |p| p * 1000);
        assert_eq!(*first_again, 1000);
    }
}
