use std::{
    collections::VecDeque,
    thread::ThreadId,
};

use parking_lot::Mutex;

/// `runOnMainThread`/`isJmeThread` (§4.H). The designated thread is fixed
/// at construction — the thread that builds the orchestrator — matching
/// §5's single main-thread ownership of the render/update step.
pub struct MainThreadQueue {
    owner: ThreadId,
    pending: Mutex<VecDeque<Box<dyn FnOnce() + Send>>>,
}

impl MainThreadQueue {
    pub fn new() -> Self {
        Self {
            owner: std::thread::current().id(),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn is_jme_thread(&self) -> bool {
        std::thread::current().id() == self.owner
    }

    /// Enqueues `job` to run at the next `drain` call, regardless of which
    /// thread `run_on_main_thread` was called from.
    pub fn run_on_main_thread(&self, job: impl FnOnce() + Send + 'static) {
        self.pending.lock().push_back(Box::new(job));
    }

    /// Runs every queued job in FIFO order. Called once per frame boundary
    /// from the main thread.
    pub fn drain(&self) {
        let jobs: Vec<_> = std::mem::take(&mut *self.pending.lock()).into_iter().collect();
        for job in jobs {
            job();
        }
    }
}

impl Default for MainThreadQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    #[test]
    fn constructing_thread_is_the_main_thread() {
        let queue = MainThreadQueue::new();
        assert!(queue.is_jme_thread());
    }

    #[test]
    fn jobs_run_in_fifo_order_on_drain() {
        let queue = MainThreadQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            queue.run_on_main_thread(move || order.lock().push(i));
        }
        queue.drain();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn drain_with_no_jobs_is_a_noop() {
        let queue = MainThreadQueue::new();
        queue.drain();
    }

    #[test]
    fn queued_jobs_from_other_threads_still_run_on_drain() {
        let queue = Arc::new(MainThreadQueue::new());
        let counter = Arc::new(AtomicU32::new(0));
        let q = queue.clone();
        let c = counter.clone();
        std::thread::spawn(move || {
            q.run_on_main_thread(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        })
        .join()
        .unwrap();
        queue.drain();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
