//! Interval polling of a single status check.
//!
//! Each [`StatusPoller`] owns one tokio task. The latest result is published
//! on a watch channel; dropping the poller aborts the task. Pollers know
//! nothing about each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// One status check. Failures are reported as display strings.
#[async_trait]
pub trait StatusCheck: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<Self::Output, String>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollSnapshot<T> {
    /// No check has completed yet.
    Waiting,
    Ready {
        value: T,
        polled_at: DateTime<Utc>,
    },
    Failed {
        message: String,
        polled_at: DateTime<Utc>,
    },
}

impl<T> PollSnapshot<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ready { value, .. } => Some(value),
            Self::Waiting | Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message, .. } => Some(message),
            Self::Waiting | Self::Ready { .. } => None,
        }
    }
}

pub struct StatusPoller<T> {
    receiver: watch::Receiver<PollSnapshot<T>>,
    handle: JoinHandle<()>,
}

impl<T: Clone + Send + Sync + 'static> StatusPoller<T> {
    /// Starts polling immediately, then every `every`. Must be called from
    /// within a tokio runtime.
    pub fn spawn<C>(check: C, every: Duration) -> Self
    where
        C: StatusCheck<Output = T>,
    {
        let (sender, receiver) = watch::channel(PollSnapshot::Waiting);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let snapshot = match check.check().await {
                    Ok(value) => {
                        debug!("event=status_poll module=poller status=ok check={}", check.name());
                        PollSnapshot::Ready {
                            value,
                            polled_at: Utc::now(),
                        }
                    }
                    Err(message) => {
                        warn!(
                            "event=status_poll module=poller status=error check={} error={}",
                            check.name(),
                            message
                        );
                        PollSnapshot::Failed {
                            message,
                            polled_at: Utc::now(),
                        }
                    }
                };
                sender.send_replace(snapshot);
            }
        });
        Self { receiver, handle }
    }

    pub fn latest(&self) -> PollSnapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Independent receiver for callers that want to await updates.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot<T>> {
        self.receiver.clone()
    }

    /// Waits for the next published snapshot and returns it.
    pub async fn next(&mut self) -> Option<PollSnapshot<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl<T> Drop for StatusPoller<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
