//! Exclusive access to the generation/synthesis engines.
//!
//! Only one "generate → segment → synthesize" sequence may run at a time.
//! [`EngineGate`] wraps a `tokio::sync::Mutex`, which grants the lock in
//! FIFO order: later callers wait behind earlier ones and nobody is turned
//! away.  The guarded work itself runs on the blocking thread pool.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinError;

/// Held while an exclusive engine job runs.
pub type GateGuard = OwnedMutexGuard<()>;

/// FIFO-fair, process-wide engine lock.  Cheap to clone.
#[derive(Clone, Default)]
pub struct EngineGate {
    lock: Arc<Mutex<()>>,
}

impl EngineGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the gate, then run `job` on the blocking pool while holding it.
    pub async fn run_blocking<F, T>(&self, job: F) -> Result<T, JoinError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.acquire().await;
        tokio::task::spawn_blocking(move || {
            let result = job();
            drop(guard);
            result
        })
        .await
    }

    /// Wait for the gate and return an owned guard.
    ///
    /// Used by streaming flows that move the guard into a blocking task, so
    /// the gate stays held until generation really ends even when the
    /// consumer goes away early.
    pub async fn acquire(&self) -> GateGuard {
        Arc::clone(&self.lock).lock_owned().await
    }

    /// `true` while some job holds the gate.  Never waits.
    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn jobs_never_overlap() {
        let gate = EngineGate::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                gate.run_blocking(move || {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(10));
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn waiting_callers_are_served_in_arrival_order() {
        let gate = EngineGate::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let first = gate.acquire().await;
        let mut handles = Vec::new();
        for i in 0..4 {
            let gate = gate.clone();
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _guard = gate.acquire().await;
                order.lock().unwrap().push(i);
            }));
            // Let the task reach the lock queue before spawning the next.
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        drop(first);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn busy_flag_tracks_the_guard() {
        let gate = EngineGate::new();
        assert!(!gate.is_busy());
        let guard = gate.acquire().await;
        assert!(gate.is_busy());
        drop(guard);
        assert!(!gate.is_busy());
    }

    #[tokio::test]
    async fn job_result_is_returned() {
        let gate = EngineGate::new();
        assert_eq!(gate.run_blocking(|| 21 * 2).await.unwrap(), 42);
    }
}
