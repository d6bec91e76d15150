//! Trailing-edge debounce with a single pending slot.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep_until, Instant};

/// Quiet window after the last change before a rebuild fires.
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Holds at most one pending deadline; every touch moves it forward.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Record an event, cancelling any earlier deadline.
    pub fn touch(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clear the slot once its deadline has passed. Returns whether it fired.
    pub fn fire(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Drive `rebuild` from a stream of changed paths until `shutdown` resolves.
///
/// `rebuild` is awaited inline, so a rebuild in progress always finishes and
/// events arriving meanwhile only queue up for the next window. Returns the
/// number of rebuilds performed.
pub async fn run_debounced<S, F, Fut>(
    mut events: UnboundedReceiver<PathBuf>,
    quiet: Duration,
    shutdown: S,
    mut rebuild: F,
) -> usize
where
    S: Future<Output = ()>,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut debouncer = Debouncer::new(quiet);
    let mut rebuilds = 0;
    let mut events_open = true;
    tokio::pin!(shutdown);

    loop {
        if !events_open && !debouncer.is_pending() {
            break;
        }
        let deadline = debouncer.deadline().unwrap_or_else(Instant::now);

        tokio::select! {
            biased;

            _ = &mut shutdown => break,

            event = events.recv(), if events_open => match event {
                Some(path) => {
                    tracing::info!("File {} has changed", path.display());
                    debouncer.touch();
                }
                None => events_open = false,
            },

            _ = sleep_until(deadline), if debouncer.is_pending() => {
                if debouncer.fire() {
                    rebuilds += 1;
                    rebuild().await;
                }
            }
        }
    }

    rebuilds
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::{mpsc, oneshot};

    use super::*;

    fn counting() -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<()>) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_events_triggers_one_rebuild() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (count, rebuild) = counting();

        let task = tokio::spawn(run_debounced(
            rx,
            QUIET_PERIOD,
            async {
                let _ = stop_rx.await;
            },
            rebuild,
        ));

        for i in 0..10 {
            tx.send(PathBuf::from(format!("partial-{i}.md"))).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        stop_tx.send(()).unwrap();
        assert_eq!(task.await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_bursts_rebuild_separately() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (count, rebuild) = counting();

        let task = tokio::spawn(run_debounced(
            rx,
            QUIET_PERIOD,
            async {
                let _ = stop_rx.await;
            },
            rebuild,
        ));

        tx.send(PathBuf::from("a.md")).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(PathBuf::from("b.md")).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        stop_tx.send(()).unwrap();
        assert_eq!(task.await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_rebuild() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (count, rebuild) = counting();

        tx.send(PathBuf::from("a.md")).unwrap();
        let rebuilds = run_debounced(
            rx,
            QUIET_PERIOD,
            tokio::time::sleep(Duration::from_millis(100)),
            rebuild,
        )
        .await;

        assert_eq!(rebuilds, 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_rebuild_still_fires_after_sender_closes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (count, rebuild) = counting();

        tx.send(PathBuf::from("a.md")).unwrap();
        drop(tx);

        let rebuilds = run_debounced(rx, QUIET_PERIOD, std::future::pending(), rebuild).await;

        assert_eq!(rebuilds, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn touch_replaces_the_single_deadline() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        rt.block_on(async {
            let mut debouncer = Debouncer::new(Duration::from_millis(300));
            assert!(!debouncer.is_pending());

            debouncer.touch();
            let first = debouncer.deadline().unwrap();
            tokio::time::advance(Duration::from_millis(200)).await;
            debouncer.touch();
            let second = debouncer.deadline().unwrap();

            assert!(second > first);
            assert!(!debouncer.fire());
            tokio::time::advance(Duration::from_millis(300)).await;
            assert!(debouncer.fire());
            assert!(!debouncer.is_pending());
        });
    }
}
