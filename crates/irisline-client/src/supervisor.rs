//! Reconnection policy: active flag plus bounded exponential backoff.
//!
//! `Idle -> Connecting -> Connected -> Backoff -> Connecting -> ...`, with
//! `Stopped` reachable from anywhere. The supervisor owns the state
//! exclusively; callers only drive transitions.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::ReconnectSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Connected,
    Backoff,
    Stopped,
}

/// Pending retry. A timer whose generation no longer matches never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub generation: u64,
    pub deadline: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub active: bool,
    pub reconnect_interval_secs: u64,
    pub phase: Phase,
    pub timer: Option<TimerHandle>,
    generation: u64,
}

struct Inner {
    min_interval_secs: u64,
    max_interval_secs: u64,
    state: Mutex<ConnectionState>,
    active_tx: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct ConnectionSupervisor {
    inner: Arc<Inner>,
}

impl ConnectionSupervisor {
    pub fn new(min_interval_secs: u64, max_interval_secs: u64) -> Self {
        let min = min_interval_secs.max(1);
        let (active_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                min_interval_secs: min,
                max_interval_secs: max_interval_secs.max(min),
                state: Mutex::new(ConnectionState {
                    active: false,
                    reconnect_interval_secs: 0,
                    phase: Phase::Idle,
                    timer: None,
                    generation: 0,
                }),
                active_tx,
            }),
        }
    }

    pub fn from_config(cfg: &ReconnectSection) -> Self {
        Self::new(cfg.min_interval_secs, cfg.max_interval_secs)
    }

    /// Returns `false` (and changes nothing) when already active.
    pub fn start(&self) -> bool {
        let mut st = self.lock();
        if st.active {
            return false;
        }
        st.active = true;
        st.reconnect_interval_secs = 0;
        st.phase = Phase::Connecting;
        drop(st);
        self.inner.active_tx.send_replace(true);
        true
    }

    pub fn on_success(&self) {
        let mut st = self.lock();
        st.reconnect_interval_secs = 0;
        if st.active {
            st.phase = Phase::Connected;
        }
    }

    /// Schedule the next retry, or `None` once stopped.
    pub fn on_failure(&self) -> Option<Duration> {
        let mut st = self.lock();
        if !st.active {
            return None;
        }
        let next = (st.reconnect_interval_secs.saturating_mul(2))
            .max(self.inner.min_interval_secs)
            .clamp(self.inner.min_interval_secs, self.inner.max_interval_secs);
        st.reconnect_interval_secs = next;
        st.phase = Phase::Backoff;
        st.generation += 1;
        let delay = Duration::from_secs(next);
        st.timer = Some(TimerHandle {
            generation: st.generation,
            deadline: Instant::now() + delay,
        });
        tracing::info!(interval_secs = next, "reconnect scheduled");
        Some(delay)
    }

    /// Idempotent. Cancels any pending timer.
    pub fn stop(&self) {
        let mut st = self.lock();
        let was_active = st.active;
        st.active = false;
        st.timer = None;
        st.generation += 1;
        st.phase = Phase::Stopped;
        drop(st);
        self.inner.active_tx.send_replace(false);
        if was_active {
            tracing::info!("supervisor stopped");
        }
    }

    /// Wait out the pending timer. `true` means the retry should proceed;
    /// `false` means the supervisor was stopped or the timer was cancelled.
    pub async fn wait_backoff(&self) -> bool {
        let pending = self.lock().timer;
        let Some(timer) = pending else {
            return self.is_active();
        };
        let mut active_rx = self.inner.active_tx.subscribe();
        tokio::select! {
            _ = tokio::time::sleep_until(timer.deadline) => {}
            _ = active_rx.wait_for(|active| !*active) => return false,
        }
        let mut st = self.lock();
        if !st.active || st.timer.map(|t| t.generation) != Some(timer.generation) {
            return false;
        }
        st.timer = None;
        st.phase = Phase::Connecting;
        true
    }

    /// Resolves once the supervisor is stopped.
    pub async fn stopped(&self) {
        let mut active_rx = self.inner.active_tx.subscribe();
        let _ = active_rx.wait_for(|active| !*active).await;
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    pub fn reconnect_interval_secs(&self) -> u64 {
        self.lock().reconnect_interval_secs
    }

    pub fn snapshot(&self) -> ConnectionState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_clamps_and_resets() {
        let sup = ConnectionSupervisor::new(1, 300);
        assert!(sup.start());
        let seq: Vec<u64> = (0..11).filter_map(|_| sup.on_failure()).map(|d| d.as_secs()).collect();
        assert_eq!(seq, vec![1, 2, 4, 8, 16, 32, 64, 128, 256, 300, 300]);

        sup.on_success();
        assert_eq!(sup.reconnect_interval_secs(), 0);
        assert_eq!(sup.snapshot().phase, Phase::Connected);
        assert_eq!(sup.on_failure().map(|d| d.as_secs()), Some(1));
    }

    #[test]
    fn start_is_idempotent_and_stop_is_safe_anytime() {
        let sup = ConnectionSupervisor::new(1, 300);
        sup.stop();
        sup.stop();
        assert_eq!(sup.snapshot().phase, Phase::Stopped);

        assert!(sup.start());
        sup.on_failure();
        assert!(!sup.start());
        assert_eq!(sup.reconnect_interval_secs(), 1);

        sup.stop();
        assert!(sup.snapshot().timer.is_none());
        assert_eq!(sup.on_failure(), None);
    }

    #[test]
    fn min_interval_floor_applies_to_first_failure() {
        let sup = ConnectionSupervisor::new(5, 12);
        sup.start();
        let seq: Vec<u64> = (0..4).filter_map(|_| sup.on_failure()).map(|d| d.as_secs()).collect();
        assert_eq!(seq, vec![5, 10, 12, 12]);
    }
}
