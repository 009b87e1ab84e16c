use async_trait::async_trait;
use recondesk_core::integrations::deploy::{
    DeployState, DeployStatus, DeployStatusCheck, SimulatedDeploySource,
};
use recondesk_core::integrations::poller::{PollSnapshot, StatusCheck, StatusPoller};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

struct CountingCheck {
    calls: Arc<AtomicUsize>,
    fail_on: usize,
}

#[async_trait]
impl StatusCheck for CountingCheck {
    type Output = usize;

    fn name(&self) -> &'static str {
        "counting"
    }

    async fn check(&self) -> Result<usize, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            Err(format!("check {call} timed out"))
        } else {
            Ok(call)
        }
    }
}

#[tokio::test(start_paused = true)]
async fn poller_publishes_a_snapshot_every_interval() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut poller = StatusPoller::spawn(
        CountingCheck {
            calls: Arc::clone(&calls),
            fail_on: 2,
        },
        Duration::from_secs(30),
    );
    let started = Instant::now();

    let first = poller.next().await.unwrap();
    assert_eq!(first.value(), Some(&1));
    assert!(started.elapsed() < Duration::from_secs(30));

    let second = poller.next().await.unwrap();
    assert_eq!(second.error(), Some("check 2 timed out"));
    assert!(started.elapsed() >= Duration::from_secs(30));

    let third = poller.next().await.unwrap();
    assert_eq!(third.value(), Some(&3));
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(poller.latest(), third);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_poller_stops_polling() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut poller = StatusPoller::spawn(
        CountingCheck {
            calls: Arc::clone(&calls),
            fail_on: 0,
        },
        Duration::from_secs(30),
    );
    poller.next().await.unwrap();
    drop(poller);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let after_drop = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_drop);
}

#[tokio::test(start_paused = true)]
async fn deploy_poller_starts_waiting_then_reports_success() {
    let mut poller = StatusPoller::spawn(
        DeployStatusCheck::new(SimulatedDeploySource::new(Some(
            "https://recon.example.com".to_string(),
        ))),
        Duration::from_secs(30),
    );
    assert_eq!(poller.latest(), PollSnapshot::<DeployStatus>::Waiting);

    let snapshot = poller.next().await.unwrap();
    let status = snapshot.value().unwrap();
    assert_eq!(status.state, DeployState::Success);
    assert_eq!(status.url.as_deref(), Some("https://recon.example.com"));
}
