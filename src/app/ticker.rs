//! Periodic driver for [`Application::tick_all`]
//!
//! Ticks carry the real time elapsed since the previous tick rather than the
//! nominal period, so a late wake-up does not slow the game down.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::application::Application;
use crate::persistence;

/// Where and how often to write the state file
#[derive(Debug, Clone)]
pub struct AutoSave {
    pub path: PathBuf,
    pub period: Duration,
}

pub struct Ticker {
    app: Arc<Application>,
    period: Duration,
    autosave: Option<AutoSave>,
}

impl Ticker {
    pub fn new(app: Arc<Application>, period: Duration) -> Self {
        Self {
            app,
            period,
            autosave: None,
        }
    }

    pub fn with_autosave(mut self, autosave: AutoSave) -> Self {
        self.autosave = Some(autosave);
        self
    }

    /// Run until the returned task is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately
        interval.tick().await;

        let mut last = Instant::now();
        let mut since_save = Duration::ZERO;
        loop {
            interval.tick().await;
            let now = Instant::now();
            let dt = now - last;
            last = now;

            let ticked = self.app.tick_all(dt);

            let Some(autosave) = &self.autosave else {
                continue;
            };
            since_save += dt;
            if since_save < autosave.period {
                continue;
            }
            since_save = Duration::ZERO;
            // Let this tick's outcomes land before taking the snapshot
            let _ = ticked.await;
            let snapshot = self.app.snapshot().await;
            let path = autosave.path.clone();
            match tokio::task::spawn_blocking(move || persistence::save(&path, &snapshot)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => log::error!("Autosave failed: {}", err),
                Err(err) => log::error!("Autosave task failed: {}", err),
            }
        }
    }
}
