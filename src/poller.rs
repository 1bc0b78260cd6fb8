use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, sleep_until};

use crate::client::{RateRequest, RateSource};
use crate::error::FetchError;
use crate::rates::RawRateTable;

#[derive(Debug)]
pub enum PollEvent {
    Rates { ticket: u64, table: RawRateTable },
    Failed { ticket: u64, error: FetchError },
}

impl PollEvent {
    pub fn ticket(&self) -> u64 {
        match self {
            PollEvent::Rates { ticket, .. } | PollEvent::Failed { ticket, .. } => *ticket,
        }
    }
}

/// Exponential backoff on top of the regular poll interval.
#[derive(Debug, Clone)]
pub struct Backoff {
    interval: Duration,
    max: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(interval: Duration, max: Duration) -> Self {
        Backoff {
            interval,
            max: max.max(interval),
            failures: 0,
        }
    }

    /// `interval * 2^failures`, capped at `max`.
    pub fn delay(&self) -> Duration {
        if self.failures == 0 {
            return self.interval;
        }
        2u32.checked_pow(self.failures)
            .and_then(|factor| self.interval.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Numbers requests in issue order and rejects answers that arrive after a
/// newer one was already delivered.
#[derive(Debug, Default)]
pub struct Tickets {
    issued: u64,
    delivered: u64,
}

impl Tickets {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn accept(&mut self, ticket: u64) -> bool {
        if ticket > self.delivered {
            self.delivered = ticket;
            true
        } else {
            false
        }
    }
}

pub struct Poller<S> {
    source: Arc<S>,
    request: RateRequest,
    interval: Duration,
    max_backoff: Duration,
}

impl<S> Poller<S>
where
    S: RateSource + 'static,
{
    pub fn new(source: Arc<S>, request: RateRequest, interval: Duration, max_backoff: Duration) -> Self {
        Poller {
            source,
            request,
            interval,
            max_backoff,
        }
    }

    /// Starts polling right away. Events stop once the handle is shut down or
    /// dropped, or the receiver goes away.
    pub fn spawn(self, events: mpsc::Sender<PollEvent>) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(events, shutdown_rx));

        PollerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    async fn run(self, events: mpsc::Sender<PollEvent>, mut shutdown: oneshot::Receiver<()>) {
        let mut in_flight = JoinSet::new();
        let mut tickets = Tickets::default();
        let mut backoff = Backoff::new(self.interval, self.max_backoff);
        let mut next_tick = Instant::now();

        log::info!("Polling {:?} every {:?}", self.request, self.interval);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = sleep_until(next_tick) => {
                    let ticket = tickets.issue();
                    let source = Arc::clone(&self.source);
                    let request = self.request;
                    in_flight.spawn(async move { (ticket, source.fetch(request).await) });
                    next_tick = Instant::now() + backoff.delay();
                }
                Some(joined) = in_flight.join_next() => {
                    let (ticket, result) = match joined {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            log::error!("Fetch task failed: {}", err);
                            continue;
                        }
                    };

                    if !tickets.accept(ticket) {
                        log::debug!("Discarding out-of-order response #{}", ticket);
                        continue;
                    }

                    let event = match result {
                        Ok(table) => {
                            backoff.record_success();
                            PollEvent::Rates { ticket, table }
                        }
                        Err(error) => {
                            backoff.record_failure();
                            let retry_at = Instant::now() + backoff.delay();
                            next_tick = next_tick.max(retry_at);
                            log::warn!(
                                "Fetch #{} failed ({} in a row), next attempt in {:?}: {}",
                                ticket,
                                backoff.failures(),
                                backoff.delay(),
                                error
                            );
                            PollEvent::Failed { ticket, error }
                        }
                    };

                    tokio::select! {
                        _ = &mut shutdown => break,
                        sent = events.send(event) => {
                            if sent.is_err() {
                                log::debug!("Event receiver closed");
                                break;
                            }
                        }
                    }
                }
            }
        }

        in_flight.abort_all();
        log::info!("Poller stopped");
    }
}

/// Owns the polling task. Dropping it stops the task and any requests in flight.
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                log::error!("Poller task ended abnormally: {}", err);
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::currency::CurrencyCode;

    enum Step {
        Rates { delay: Duration, timestamp: i64 },
        Fail,
    }

    struct ScriptedSource {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(ScriptedSource {
                steps: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn table(timestamp: i64) -> RawRateTable {
        let usd: CurrencyCode = "USD".parse().unwrap();
        RawRateTable::new(vec![(usd, 1.0)], Some(timestamp))
    }

    #[async_trait]
    impl RateSource for ScriptedSource {
        async fn fetch(&self, _request: RateRequest) -> Result<RawRateTable, FetchError> {
            self.calls.lock().unwrap().push(Instant::now());
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Rates { delay, timestamp }) => {
                    tokio::time::sleep(delay).await;
                    Ok(table(timestamp))
                }
                Some(Step::Fail) => Err(FetchError::Status(503)),
                None => Ok(table(0)),
            }
        }
    }

    #[test]
    fn test_backoff_delays() {
        let mut backoff = Backoff::new(Duration::from_secs(2), Duration::from_secs(30));
        assert_eq!(backoff.delay(), Duration::from_secs(2));

        backoff.record_failure();
        assert_eq!(backoff.delay(), Duration::from_secs(4));
        backoff.record_failure();
        assert_eq!(backoff.delay(), Duration::from_secs(8));
        for _ in 0..40 {
            backoff.record_failure();
        }
        assert_eq!(backoff.delay(), Duration::from_secs(30));

        backoff.record_success();
        assert_eq!(backoff.delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_tickets_reject_older_answers() {
        let mut tickets = Tickets::default();
        let first = tickets.issue();
        let second = tickets.issue();

        assert!(tickets.accept(second));
        assert!(!tickets.accept(first));
        assert!(!tickets.accept(second));

        let third = tickets.issue();
        assert!(tickets.accept(third));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_is_discarded() {
        let source = ScriptedSource::new(vec![
            Step::Rates { delay: Duration::from_secs(3), timestamp: 1 },
            Step::Rates { delay: Duration::from_millis(100), timestamp: 2 },
        ]);
        let (tx, mut rx) = mpsc::channel(16);
        let handle = Poller::new(
            source.clone(),
            RateRequest::Latest,
            Duration::from_secs(1),
            Duration::from_secs(8),
        )
        .spawn(tx);

        let mut seen = Vec::new();
        while seen.len() < 4 {
            let event = rx.recv().await.unwrap();
            seen.push(event.ticket());
        }
        handle.shutdown().await;

        assert_eq!(seen[0], 2);
        assert!(!seen.contains(&1));
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_back_off() {
        let source = ScriptedSource::new(vec![Step::Fail, Step::Fail, Step::Fail, Step::Fail]);
        let (tx, mut rx) = mpsc::channel(16);
        let handle = Poller::new(
            source.clone(),
            RateRequest::Latest,
            Duration::from_secs(1),
            Duration::from_secs(4),
        )
        .spawn(tx);

        for _ in 0..4 {
            assert!(matches!(rx.recv().await, Some(PollEvent::Failed { .. })));
        }
        handle.shutdown().await;

        let calls = source.calls();
        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        let expected = [2, 4, 4];
        for (gap, secs) in gaps.iter().zip(expected) {
            let secs = Duration::from_secs(secs);
            assert!(*gap >= secs && *gap < secs + Duration::from_millis(10), "{:?}", gaps);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_events() {
        let source = ScriptedSource::new(vec![]);
        let (tx, mut rx) = mpsc::channel(16);
        let handle = Poller::new(
            source.clone(),
            RateRequest::Latest,
            Duration::from_secs(1),
            Duration::from_secs(4),
        )
        .spawn(tx);

        assert!(matches!(rx.recv().await, Some(PollEvent::Rates { ticket: 1, .. })));
        handle.shutdown().await;
        let calls = source.calls().len();

        tokio::time::sleep(Duration::from_secs(10)).await;
        while rx.try_recv().is_ok() {}
        assert!(rx.recv().await.is_none());
        assert_eq!(source.calls().len(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_with_full_channel() {
        let source = ScriptedSource::new(vec![]);
        let (tx, rx) = mpsc::channel(1);
        let handle = Poller::new(
            source.clone(),
            RateRequest::Latest,
            Duration::from_secs(1),
            Duration::from_secs(4),
        )
        .spawn(tx);

        // Nobody reads, so the poller ends up waiting on a full channel.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(source.calls().len() >= 2);

        let stopped = tokio::time::timeout(Duration::from_secs(1), handle.shutdown()).await;
        assert!(stopped.is_ok());
        drop(rx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_receiver_stops_poller() {
        let source = ScriptedSource::new(vec![]);
        let (tx, rx) = mpsc::channel(1);
        let handle = Poller::new(
            source.clone(),
            RateRequest::Latest,
            Duration::from_secs(1),
            Duration::from_secs(4),
        )
        .spawn(tx);
        drop(rx);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.calls().len(), 1);
        handle.shutdown().await;
    }
}
