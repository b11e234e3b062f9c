//! The bounded, index-ordered tile-processing pool (spec §4.7).
//!
//! A fixed set of worker threads drains a bounded `sync_channel` submit
//! queue; each completed job's result -- a [`crate::TileData`] -- is
//! pushed into a `BinaryHeap` keyed by its index so the consumer can
//! reconstruct output order regardless of completion order. `rayon` is
//! deliberately not used here: its `par_iter` does not expose the
//! index-ordered draining the V2->V1 directions require (spec §9, "no
//! coroutines; a plain thread pool suffices"; shape grounded in
//! `Tacotakedown-e170-terrain-radar`'s per-tile parallel loop, adapted
//! from `rayon`'s unordered fan-out to an ordered `Condvar` drain).

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::mpsc::sync_channel;
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

struct Job<T> {
    index: u64,
    work: Box<dyn FnOnce() -> T + Send>,
}

struct OrderedResult<T> {
    index: u64,
    output: T,
}

impl<T> PartialEq for OrderedResult<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}
impl<T> Eq for OrderedResult<T> {}
impl<T> PartialOrd for OrderedResult<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for OrderedResult<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

struct Shared<T> {
    heap: Mutex<BinaryHeap<Reverse<OrderedResult<T>>>>,
    cond: Condvar,
}

/// A pool of `T` worker threads draining a bounded submit queue of
/// capacity `C`, with an index-ordered output heap (spec §4.7).
pub struct TilePool<T: Send + 'static> {
    sender: Option<SyncSender<Job<T>>>,
    workers: Vec<JoinHandle<()>>,
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> TilePool<T> {
    pub fn new(threads: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = sync_channel::<Job<T>>(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let shared = Arc::new(Shared {
            heap: Mutex::new(BinaryHeap::new()),
            cond: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(threads.max(1));
        for _ in 0..threads.max(1) {
            let rx = Arc::clone(&rx);
            let shared = Arc::clone(&shared);
            workers.push(std::thread::spawn(move || loop {
                let job = {
                    let rx = rx.lock().expect("pool receiver mutex poisoned");
                    rx.recv()
                };
                let Ok(job) = job else { break };
                let output = (job.work)();
                let mut heap = shared.heap.lock().expect("pool heap mutex poisoned");
                heap.push(Reverse(OrderedResult { index: job.index, output }));
                shared.cond.notify_all();
            }));
        }

        Self { sender: Some(tx), workers, shared }
    }

    /// Enqueues a unit of work. Blocks if the queue is already at
    /// capacity `C` (spec §4.7 "Producers call submit(work); when the
    /// queue is full, submit blocks").
    pub fn submit(&self, index: u64, work: impl FnOnce() -> T + Send + 'static) {
        let job = Job { index, work: Box::new(work) };
        self.sender
            .as_ref()
            .expect("pool is still open while any orchestrator holds it")
            .send(job)
            .expect("worker threads stay alive for the pool's lifetime");
    }

    /// Blocks until the heap's minimum index equals `next_expected`, then
    /// pops and returns it (spec §4.7, ordered consumer protocol).
    pub fn recv_in_order(&self, next_expected: u64) -> (u64, T) {
        let mut heap = self.shared.heap.lock().expect("pool heap mutex poisoned");
        loop {
            if matches!(heap.peek(), Some(Reverse(top)) if top.index == next_expected) {
                let Reverse(result) = heap.pop().expect("just confirmed non-empty");
                return (result.index, result.output);
            }
            heap = self.shared.cond.wait(heap).expect("pool heap mutex poisoned");
        }
    }

    /// Blocks until at least one result is ready, then pops and returns
    /// it in no particular order (spec §4.7, unordered consumer protocol).
    pub fn recv_any(&self) -> (u64, T) {
        let mut heap = self.shared.heap.lock().expect("pool heap mutex poisoned");
        loop {
            if let Some(Reverse(result)) = heap.pop() {
                return (result.index, result.output);
            }
            heap = self.shared.cond.wait(heap).expect("pool heap mutex poisoned");
        }
    }

    /// Non-blocking drain of every currently-ready result (used by the
    /// unordered consumer loop: drain what's ready, then submit more).
    pub fn drain_ready(&self) -> Vec<(u64, T)> {
        let mut heap = self.shared.heap.lock().expect("pool heap mutex poisoned");
        let mut out = Vec::with_capacity(heap.len());
        while let Some(Reverse(result)) = heap.pop() {
            out.push((result.index, result.output));
        }
        out
    }
}

impl<T: Send + 'static> Drop for TilePool<T> {
    /// Closes the submit queue and joins every worker, so no thread is
    /// left running past the pool's lifetime (spec §5).
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn ordered_recv_reconstructs_submission_order() {
        let pool: TilePool<u64> = TilePool::new(4, 8);
        for i in (0..20u64).rev() {
            pool.submit(i, move || i * 10);
        }
        let mut received = Vec::new();
        for expected in 0..20u64 {
            let (idx, output) = pool.recv_in_order(expected);
            assert_eq!(idx, expected);
            received.push(output);
        }
        assert_eq!(received, (0..20u64).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn unordered_recv_returns_every_submitted_job() {
        let pool: TilePool<u64> = TilePool::new(4, 4);
        let completed = Arc::new(AtomicUsize::new(0));
        for i in 0..10u64 {
            let completed = Arc::clone(&completed);
            pool.submit(i, move || {
                completed.fetch_add(1, Ordering::SeqCst);
                i
            });
        }
        let mut seen = Vec::new();
        while seen.len() < 10 {
            let (idx, _) = pool.recv_any();
            seen.push(idx);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..10u64).collect::<Vec<_>>());
        assert_eq!(completed.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn pool_drop_joins_all_workers() {
        let pool: TilePool<u64> = TilePool::new(2, 4);
        pool.submit(0, || 42);
        let _ = pool.recv_any();
        drop(pool);
    }
}
