//! Trailing-edge debouncing.
//!
//! The debouncer owns a single pending item and its deadline. Every push
//! replaces the item and restarts the window, so a burst of events settles
//! into exactly one item: the last one.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replace the pending item and restart the window.
    pub fn push(&mut self, item: T) {
        self.pending = Some((item, Instant::now() + self.window));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending item, if any, and stop the timer.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(item, _)| item)
    }

    /// Wait until the window elapses with no new item, feeding items from
    /// `rx` as they arrive. Returns `None` once `rx` is closed and nothing is
    /// pending; a pending item is still delivered when the channel closes.
    pub async fn next(&mut self, rx: &mut UnboundedReceiver<T>) -> Option<T> {
        loop {
            let Some((_, deadline)) = self.pending.as_ref() else {
                let item = rx.recv().await?;
                self.push(item);
                continue;
            };
            let deadline = *deadline;
            tokio::select! {
                item = rx.recv() => match item {
                    Some(item) => self.push(item),
                    None => return self.cancel(),
                },
                _ = tokio::time::sleep_until(deadline) => return self.cancel(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const WINDOW: Duration = Duration::from_millis(2000);

    #[tokio::test(start_paused = true)]
    async fn burst_settles_into_last_item() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(WINDOW);

        let sender = tokio::spawn(async move {
            for i in 0..5 {
                tx.send(i).unwrap();
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            tx
        });

        let start = Instant::now();
        let settled = debouncer.next(&mut rx).await;
        assert_eq!(settled, Some(4));
        // Last push at 2000ms, window of 2000ms.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(4000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(4500), "{elapsed:?}");
        assert!(!debouncer.is_pending());
        drop(sender.await.unwrap());
        assert_eq!(debouncer.next(&mut rx).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_events_fire_separately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(WINDOW);

        tx.send("a").unwrap();
        assert_eq!(debouncer.next(&mut rx).await, Some("a"));
        tx.send("b").unwrap();
        assert_eq!(debouncer.next(&mut rx).await, Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_item_survives_channel_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(WINDOW);
        tx.send(1).unwrap();
        drop(tx);
        let start = Instant::now();
        assert_eq!(debouncer.next(&mut rx).await, Some(1));
        assert!(start.elapsed() < WINDOW);
        assert_eq!(debouncer.next(&mut rx).await, None);
    }

    #[tokio::test]
    async fn cancel_clears_pending() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push("x");
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.cancel(), Some("x"));
        assert!(!debouncer.is_pending());
    }
}
