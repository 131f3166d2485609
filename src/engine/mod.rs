use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    storage::counter::CounterStore, utils::clock::DefaultClock, window_api::GenericWindowPoller,
};

pub mod classifier;
pub mod shutdown;
pub mod tracker;

use tracker::Tracker;

/// Represents the starting point for the tracking engine.
pub async fn start_engine(dir: PathBuf) -> Result<()> {
    std::env::set_current_dir("/")?;

    let store = CounterStore::new(dir)?;
    let poller = GenericWindowPoller::new()?;
    let shutdown_token = CancellationToken::new();

    let mut tracker = Tracker::new(
        store,
        Box::new(poller),
        Arc::new(DefaultClock),
        shutdown_token.clone(),
    );
    tracker.init();
    tracker.start();

    shutdown::detect_shutdown(shutdown_token).await;

    tracker.stop().await;
    info!(
        "Engine stopped with {}",
        serde_json::to_string(&tracker.snapshot())?
    );
    Ok(())
}

#[cfg(test)]
mod engine_tests {
    use std::{sync::Arc, time::Duration};

    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    use crate::{
        engine::tracker::Tracker,
        storage::counter::{BADGE_FILE, CounterStore},
        utils::{clock::DefaultClock, logging::TEST_LOGGING},
        window_api::MockWindowPoller,
    };

    /// Very simple smoke test to check that sampling, classification and the
    /// shutdown flush work together.
    #[tokio::test(start_paused = true)]
    async fn smoke_test_engine() {
        *TEST_LOGGING;
        let mut poller = MockWindowPoller::new();
        let mut items = [
            Some("lib.rs - codetime - Visual Studio Code"),
            Some("Photos"),
            None,
        ]
        .into_iter()
        .cycle();
        poller
            .expect_poll_title()
            .returning(move || Ok(items.next().unwrap().map(Arc::from)));

        let dir = tempdir().unwrap();
        let store = CounterStore::new(dir.path().to_path_buf()).unwrap();
        let mut tracker = Tracker::new(
            CounterStore::new(dir.path().to_path_buf()).unwrap(),
            Box::new(poller),
            Arc::new(DefaultClock),
            CancellationToken::new(),
        );

        tracker.init();
        tracker.start();
        tokio::time::sleep(Duration::from_millis(5500)).await;
        tracker.stop().await;

        let total = tracker.total_time();
        assert!(total >= 1);
        assert_eq!(tracker.session_time(), total);
        assert_eq!(store.load(), total);
        assert!(dir.path().join(BADGE_FILE).exists());
    }
}
