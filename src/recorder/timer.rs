//! Elapsed-seconds counter for an active recording

use super::controller::SessionEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct ElapsedTimer {
    seconds: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl ElapsedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart from zero and tick once per second
    pub fn start(&mut self, events: broadcast::Sender<SessionEvent>) {
        self.stop();
        self.seconds.store(0, Ordering::SeqCst);

        let seconds = self.seconds.clone();
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let elapsed = seconds.fetch_add(1, Ordering::SeqCst) + 1;
                let _ = events.send(SessionEvent::Tick(elapsed));
            }
        }));
    }

    /// Freeze the counter at its current value
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn reset(&mut self) {
        self.stop();
        self.seconds.store(0, Ordering::SeqCst);
    }

    pub fn seconds(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_counts_whole_seconds() {
        let (events, _) = broadcast::channel(16);
        let mut timer = ElapsedTimer::new();

        timer.start(events);
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(timer.seconds(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_and_restart_resets() {
        let (events, _) = broadcast::channel(16);
        let mut timer = ElapsedTimer::new();

        timer.start(events.clone());
        tokio::time::sleep(Duration::from_millis(2500)).await;
        timer.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(timer.seconds(), 2);
        assert!(!timer.is_running());

        timer.start(events);
        assert_eq!(timer.seconds(), 0);
    }
}
