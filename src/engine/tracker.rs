use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{storage::counter::CounterStore, utils::clock::Clock, window_api::WindowPoller};

use super::classifier::is_tracked;

/// Sentinel title reported while no window has focus.
pub const IDLE_APP: &str = "Idle";

/// Interval between two samples. The loop sleeps this long after every cycle;
/// the time the cycle body itself consumes is deliberately not compensated.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Number of accounted seconds between two durable flushes.
const FLUSH_EVERY_SECONDS: u64 = 5;

/// Mutable accounting state. Every field is read and written under the one
/// lock in [Tracker], so readers never observe a half-applied sampling cycle.
#[derive(Debug)]
struct TrackerState {
    /// Cumulative tracked seconds across all runs. Only ever incremented.
    total_seconds: u64,
    /// Tracked seconds since this process started.
    session_seconds: u64,
    /// Whether the most recent sample matched the whitelist.
    is_tracking: bool,
    /// Title of the most recent sample, or [IDLE_APP].
    current_app: Arc<str>,
}

impl TrackerState {
    fn new() -> Self {
        Self {
            total_seconds: 0,
            session_seconds: 0,
            is_tracking: false,
            current_app: IDLE_APP.into(),
        }
    }
}

/// Point-in-time copy of the tracker state for presentation and logging.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSnapshot {
    pub total_seconds: u64,
    pub session_seconds: u64,
    pub is_tracking: bool,
    pub current_app: Arc<str>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub captured_at: DateTime<Utc>,
}

/// The tracking engine. Owns the shared accounting state and the background
/// sampling task; every other component only reads through the accessors.
pub struct Tracker {
    state: Arc<Mutex<TrackerState>>,
    store: Arc<CounterStore>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
    poller: Option<Box<dyn WindowPoller>>,
    loop_handle: Option<JoinHandle<()>>,
}

impl Tracker {
    pub fn new(
        store: CounterStore,
        poller: Box<dyn WindowPoller>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState::new())),
            store: Arc::new(store),
            clock,
            shutdown,
            poller: Some(poller),
            loop_handle: None,
        }
    }

    /// Loads the persisted counter. The session counter always starts at zero.
    pub fn init(&self) {
        let total = self.store.load();
        let mut state = lock(&self.state);
        state.total_seconds = total;
        state.session_seconds = 0;
        info!("Loaded {total} tracked seconds");
    }

    /// Spawns the sampling loop. Calling this twice is a no-op, the engine
    /// never runs more than one sampler.
    pub fn start(&mut self) {
        if self.loop_handle.is_some() {
            return;
        }
        let Some(poller) = self.poller.take() else {
            return;
        };
        let sampler = SamplerLoop {
            state: self.state.clone(),
            store: self.store.clone(),
            poller,
            shutdown: self.shutdown.clone(),
            interval: SAMPLE_INTERVAL,
            clock: self.clock.clone(),
        };
        self.loop_handle = Some(tokio::spawn(sampler.run()));
    }

    /// Stops the sampling loop and performs one unconditional flush, so no
    /// accounted second is lost on a clean shutdown. The flush happens even
    /// when the loop never produced a tick.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.loop_handle.take() {
            if let Err(e) = handle.await {
                error!("Sampling task failed {e:?}");
            }
        }
        let state = lock(&self.state);
        flush(&self.store, state.total_seconds);
    }

    pub fn total_time(&self) -> u64 {
        lock(&self.state).total_seconds
    }

    pub fn session_time(&self) -> u64 {
        lock(&self.state).session_seconds
    }

    pub fn is_tracking(&self) -> bool {
        lock(&self.state).is_tracking
    }

    pub fn current_app(&self) -> Arc<str> {
        lock(&self.state).current_app.clone()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let state = lock(&self.state);
        TrackerSnapshot {
            total_seconds: state.total_seconds,
            session_seconds: state.session_seconds,
            is_tracking: state.is_tracking,
            current_app: state.current_app.clone(),
            captured_at: self.clock.time(),
        }
    }
}

/// The background sampling task. One cycle per [SAMPLE_INTERVAL]: poll the
/// focused window, classify, account, flush on the cadence boundary.
struct SamplerLoop {
    state: Arc<Mutex<TrackerState>>,
    store: Arc<CounterStore>,
    poller: Box<dyn WindowPoller>,
    shutdown: CancellationToken,
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl SamplerLoop {
    async fn run(mut self) {
        loop {
            self.sample_once();

            tokio::select! {
                // Cancellation stops the loop. The final flush is done by
                // [Tracker::stop] after this task has been joined.
                _ = self.shutdown.cancelled() => return,
                _ = self.clock.sleep(self.interval) => (),
            }
        }
    }

    /// One sampling cycle. Classification, accounting and the cadence flush
    /// form a single critical section, so readers always observe a consistent
    /// (title, classification, counters) triple.
    fn sample_once(&mut self) {
        let title = match self.poller.poll_title() {
            Ok(v) => v,
            Err(e) => {
                error!("Encountered an error during window polling {e:?}");
                None
            }
        };

        let mut state = lock(&self.state);
        match title {
            None => {
                state.current_app = IDLE_APP.into();
                state.is_tracking = false;
            }
            Some(title) => {
                state.is_tracking = is_tracked(&title);
                state.current_app = title;
                if state.is_tracking {
                    state.total_seconds += 1;
                    state.session_seconds += 1;
                    if state.total_seconds % FLUSH_EVERY_SECONDS == 0 {
                        debug!("Reached flush boundary at {} seconds", state.total_seconds);
                        flush(&self.store, state.total_seconds);
                    }
                }
            }
        }
    }
}

/// Persists the counter and regenerates the badge. Failures are logged and
/// dropped, the next cadence boundary retries naturally.
fn flush(store: &CounterStore, total_seconds: u64) {
    if let Err(e) = store.save(total_seconds) {
        error!("Failed to persist counter {e:?}");
    }
    if let Err(e) = store.update_badge(total_seconds) {
        error!("Failed to update badge {e:?}");
    }
}

fn lock(state: &Arc<Mutex<TrackerState>>) -> MutexGuard<'_, TrackerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tracker_tests {
    use tempfile::tempdir;

    use crate::{
        storage::{
            badge::render_badge,
            counter::{BADGE_FILE, DATA_FILE},
        },
        utils::{clock::DefaultClock, logging::TEST_LOGGING},
        window_api::MockWindowPoller,
    };

    use super::*;

    fn scripted_poller(sequence: Vec<Option<&str>>) -> MockWindowPoller {
        let mut poller = MockWindowPoller::new();
        let mut items = sequence
            .into_iter()
            .map(|v| v.map(Arc::<str>::from))
            .collect::<Vec<_>>()
            .into_iter();
        poller
            .expect_poll_title()
            .returning(move || Ok(items.next().unwrap()));
        poller
    }

    fn sampler(dir: &std::path::Path, poller: MockWindowPoller) -> SamplerLoop {
        SamplerLoop {
            state: Arc::new(Mutex::new(TrackerState::new())),
            store: Arc::new(CounterStore::new(dir.to_path_buf()).unwrap()),
            poller: Box::new(poller),
            shutdown: CancellationToken::new(),
            interval: SAMPLE_INTERVAL,
            clock: Arc::new(DefaultClock),
        }
    }

    #[test]
    fn counts_only_tracked_samples() {
        *TEST_LOGGING;
        let dir = tempdir().unwrap();
        let mut sampler = sampler(
            dir.path(),
            scripted_poller(vec![
                Some("main.rs - codetime - Visual Studio Code"),
                Some("Spotify Premium"),
                Some("GOOGLE CHROME - new tab"),
                None,
            ]),
        );

        sampler.sample_once();
        {
            let state = lock(&sampler.state);
            assert_eq!(state.total_seconds, 1);
            assert_eq!(state.session_seconds, 1);
            assert!(state.is_tracking);
            assert_eq!(&*state.current_app, "main.rs - codetime - Visual Studio Code");
        }

        sampler.sample_once();
        {
            let state = lock(&sampler.state);
            assert_eq!(state.total_seconds, 1);
            assert_eq!(state.session_seconds, 1);
            assert!(!state.is_tracking);
            assert_eq!(&*state.current_app, "Spotify Premium");
        }

        sampler.sample_once();
        assert_eq!(lock(&sampler.state).total_seconds, 2);

        sampler.sample_once();
        {
            let state = lock(&sampler.state);
            assert_eq!(state.total_seconds, 2);
            assert!(!state.is_tracking);
            assert_eq!(&*state.current_app, IDLE_APP);
        }
    }

    #[test]
    fn poll_errors_classify_the_cycle_as_idle() {
        *TEST_LOGGING;
        let dir = tempdir().unwrap();
        let mut poller = MockWindowPoller::new();
        poller
            .expect_poll_title()
            .returning(|| Err(anyhow::anyhow!("display server went away")));
        let mut sampler = sampler(dir.path(), poller);

        sampler.sample_once();

        let state = lock(&sampler.state);
        assert_eq!(state.total_seconds, 0);
        assert!(!state.is_tracking);
        assert_eq!(&*state.current_app, IDLE_APP);
    }

    #[test]
    fn flushes_on_five_second_boundaries() {
        *TEST_LOGGING;
        let dir = tempdir().unwrap();
        let data = dir.path().join(DATA_FILE);
        let mut sampler = sampler(dir.path(), scripted_poller(vec![Some("IntelliJ IDEA"); 6]));

        for _ in 0..4 {
            sampler.sample_once();
        }
        assert!(!data.exists());

        sampler.sample_once();
        assert_eq!(std::fs::read_to_string(&data).unwrap(), "5");
        assert_eq!(
            std::fs::read_to_string(dir.path().join(BADGE_FILE)).unwrap(),
            render_badge(5)
        );

        // The next tracked second leaves the boundary again.
        sampler.sample_once();
        assert_eq!(std::fs::read_to_string(&data).unwrap(), "5");
        assert_eq!(lock(&sampler.state).total_seconds, 6);
    }

    #[test]
    fn idle_cycles_never_flush() {
        *TEST_LOGGING;
        let dir = tempdir().unwrap();
        let data = dir.path().join(DATA_FILE);
        let mut titles = vec![Some("Terminal"); 5];
        titles.extend([None, Some("Minesweeper")]);
        let mut sampler = sampler(dir.path(), scripted_poller(titles));

        for _ in 0..5 {
            sampler.sample_once();
        }
        assert_eq!(std::fs::read_to_string(&data).unwrap(), "5");
        std::fs::remove_file(&data).unwrap();

        // Both an idle and an untracked cycle sit on the multiple-of-5 total,
        // neither may write.
        sampler.sample_once();
        assert!(!data.exists());
        sampler.sample_once();
        assert!(!data.exists());
        assert_eq!(lock(&sampler.state).total_seconds, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_flushes_even_without_ticks() {
        *TEST_LOGGING;
        let dir = tempdir().unwrap();
        let mut poller = MockWindowPoller::new();
        poller.expect_poll_title().returning(|| Ok(None));
        let mut tracker = Tracker::new(
            CounterStore::new(dir.path().to_path_buf()).unwrap(),
            Box::new(poller),
            Arc::new(DefaultClock),
            CancellationToken::new(),
        );

        tracker.init();
        tracker.start();
        tracker.stop().await;

        assert_eq!(
            std::fs::read_to_string(dir.path().join(DATA_FILE)).unwrap(),
            "0"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join(BADGE_FILE)).unwrap(),
            render_badge(0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resumes_persisted_total_with_a_fresh_session() {
        *TEST_LOGGING;
        let dir = tempdir().unwrap();
        let store = CounterStore::new(dir.path().to_path_buf()).unwrap();
        store.save(42).unwrap();

        let mut poller = MockWindowPoller::new();
        poller
            .expect_poll_title()
            .returning(|| Ok(Some("CLion - tracker.rs".into())));
        let mut tracker = Tracker::new(
            CounterStore::new(dir.path().to_path_buf()).unwrap(),
            Box::new(poller),
            Arc::new(DefaultClock),
            CancellationToken::new(),
        );

        tracker.init();
        assert_eq!(tracker.total_time(), 42);
        assert_eq!(tracker.session_time(), 0);
        assert!(!tracker.is_tracking());
        assert_eq!(&*tracker.current_app(), IDLE_APP);

        tracker.start();
        tracker.start();
        tokio::time::sleep(Duration::from_secs(3)).await;
        tracker.stop().await;

        let total = tracker.total_time();
        assert!(total > 42);
        assert_eq!(tracker.session_time(), total - 42);
        assert!(tracker.is_tracking());
        assert_eq!(&*tracker.current_app(), "CLion - tracker.rs");
        assert_eq!(store.load(), total);
    }

    #[test]
    fn snapshot_serializes_every_field() {
        *TEST_LOGGING;
        let dir = tempdir().unwrap();
        let tracker = Tracker::new(
            CounterStore::new(dir.path().to_path_buf()).unwrap(),
            Box::new(MockWindowPoller::new()),
            Arc::new(DefaultClock),
            CancellationToken::new(),
        );
        tracker.init();

        let value = serde_json::to_value(tracker.snapshot()).unwrap();

        assert_eq!(value["total_seconds"], 0);
        assert_eq!(value["session_seconds"], 0);
        assert_eq!(value["is_tracking"], false);
        assert_eq!(value["current_app"], IDLE_APP);
        assert!(value["captured_at"].is_i64());
    }
}
