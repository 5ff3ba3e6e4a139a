//! Per-path ordering of backup I/O.
//!
//! Every operation on a backup file takes its place in line for that path at
//! the moment it is *submitted*, not when its future is first polled. An
//! edit-then-close sequence therefore always lands as write-then-delete on
//! disk, even if the caller spawns both futures and the runtime polls them in
//! the opposite order.
//!
//! Paths nest: an operation on a directory is ordered against every
//! operation on a path inside it, in both directions. Deleting a workspace's
//! backup directory waits for pending writes into it, and writes submitted
//! after the delete wait for it to finish. Operations on unrelated paths
//! never wait on each other.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

struct Tail {
    seq: u64,
    done: watch::Receiver<bool>,
}

#[derive(Clone, Default)]
pub struct PathQueue {
    tails: Arc<Mutex<HashMap<PathBuf, Tail>>>,
    next_seq: Arc<AtomicU64>,
}

impl PathQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next slot for `path` and return a future that runs `op`
    /// once every earlier operation on `path`, on a directory containing
    /// it, or on anything inside it has finished.
    ///
    /// `op` must be lazy (an `async` block); nothing in it may run before the
    /// returned future is awaited.
    pub fn enqueue<F, T>(&self, path: PathBuf, op: F) -> impl Future<Output = T> + Send + 'static
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = watch::channel(false);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let earlier: Vec<watch::Receiver<bool>> = {
            let mut tails = lock(&self.tails);
            let earlier = tails
                .iter()
                .filter(|(other, _)| overlaps(&path, other))
                .map(|(_, tail)| tail.done.clone())
                .collect();
            tails.insert(
                path.clone(),
                Tail {
                    seq,
                    done: done_rx,
                },
            );
            earlier
        };

        let tails = Arc::clone(&self.tails);
        async move {
            for done in earlier {
                finished(done).await;
            }
            let out = op.await;
            let _ = done_tx.send(true);

            let mut tails = lock(&tails);
            if tails.get(&path).is_some_and(|tail| tail.seq == seq) {
                tails.remove(&path);
            }
            out
        }
    }

    #[cfg(test)]
    fn pending_paths(&self) -> usize {
        lock(&self.tails).len()
    }
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Resolves once the operation behind `done` completed or was dropped.
async fn finished(mut done: watch::Receiver<bool>) {
    while !*done.borrow() {
        if done.changed().await.is_err() {
            return;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn logged(
        queue: &PathQueue,
        log: &Arc<Mutex<Vec<&'static str>>>,
        path: &str,
        delay_ms: u64,
        entry: &'static str,
    ) -> impl Future<Output = ()> + Send + 'static {
        let log = Arc::clone(log);
        queue.enqueue(PathBuf::from(path), async move {
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            log.lock().unwrap().push(entry);
        })
    }

    #[tokio::test]
    async fn test_same_path_runs_in_submission_order() {
        let queue = PathQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let slow = logged(&queue, &log, "/b/x", 30, "write");
        let fast = logged(&queue, &log, "/b/x", 0, "discard");

        // Spawn in reverse so the runtime sees the later op first.
        let b = tokio::spawn(fast);
        let a = tokio::spawn(slow);
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["write", "discard"]);
        assert_eq!(queue.pending_paths(), 0);
    }

    #[tokio::test]
    async fn test_different_paths_do_not_wait() {
        let queue = PathQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let slow = logged(&queue, &log, "/b/slow", 50, "slow");
        let fast = logged(&queue, &log, "/b/fast", 0, "fast");

        let a = tokio::spawn(slow);
        let b = tokio::spawn(fast);
        b.await.unwrap();
        a.await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn test_directory_waits_for_paths_inside_it() {
        let queue = PathQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let write_a = logged(&queue, &log, "/b/ws/file/a", 40, "write a");
        let write_b = logged(&queue, &log, "/b/ws/untitled/u", 20, "write b");
        let discard_all = logged(&queue, &log, "/b/ws", 0, "discard all");

        let c = tokio::spawn(discard_all);
        let a = tokio::spawn(write_a);
        let b = tokio::spawn(write_b);
        c.await.unwrap();
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(log.lock().unwrap().last(), Some(&"discard all"));
        assert_eq!(queue.pending_paths(), 0);
    }

    #[tokio::test]
    async fn test_paths_inside_wait_for_directory() {
        let queue = PathQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let discard_all = logged(&queue, &log, "/b/ws", 30, "discard all");
        let write = logged(&queue, &log, "/b/ws/file/a", 0, "write");
        let other = logged(&queue, &log, "/b/other/file/a", 0, "other");

        let w = tokio::spawn(write);
        let o = tokio::spawn(other);
        let d = tokio::spawn(discard_all);
        o.await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["other"]);
        w.await.unwrap();
        d.await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["other", "discard all", "write"]);
    }

    #[test]
    fn test_sibling_prefixes_do_not_overlap() {
        assert!(overlaps(Path::new("/b/ws"), Path::new("/b/ws/file/a")));
        assert!(overlaps(Path::new("/b/ws/file/a"), Path::new("/b/ws")));
        assert!(!overlaps(Path::new("/b/ws"), Path::new("/b/ws2/file/a")));
    }

    #[tokio::test]
    async fn test_dropped_operation_releases_queue() {
        let queue = PathQueue::new();
        let path = PathBuf::from("/b/x");

        let abandoned = queue.enqueue(path.clone(), async { 1 });
        let next = queue.enqueue(path.clone(), async { 2 });
        drop(abandoned);

        assert_eq!(next.await, 2);
        assert_eq!(queue.pending_paths(), 0);
    }
}
