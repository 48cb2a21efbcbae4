// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Play/pause animation timer.
//!
//! The scheduler owns at most one repeating timer. The timer runs as a tokio
//! task that posts [`Command::Tick`] into the viewer's command channel; the
//! viewer then advances the time series on the UI thread. Every start and
//! stop bumps a generation counter so ticks already queued by a cancelled
//! timer are recognised and dropped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::timeseries::TimeSeriesController;
use crate::viewer::Command;

/// Tick cadence used when none is configured.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(2000);

/// Callback fired after each tick is queued (e.g. to request a repaint).
pub type WakeFn = Arc<dyn Fn() + Send + Sync>;

pub struct AnimationScheduler {
    interval: Duration,
    commands: mpsc::UnboundedSender<Command>,
    timer: Option<CancellationToken>,
    generation: u64,
    wake: Option<WakeFn>,
}

impl fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("interval", &self.interval)
            .field("running", &self.timer.is_some())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl AnimationScheduler {
    #[must_use]
    pub fn new(interval: Duration, commands: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            interval,
            commands,
            timer: None,
            generation: 0,
            wake: None,
        }
    }

    pub fn set_wake(&mut self, wake: WakeFn) {
        self.wake = Some(wake);
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Flip between playing and paused. Returns the new playing state.
    pub fn toggle_play(&mut self, series: &mut TimeSeriesController) -> bool {
        if series.is_playing() {
            self.stop(series);
        } else {
            self.start(series);
        }
        series.is_playing()
    }

    /// Start ticking, replacing any timer that is already running.
    pub fn start(&mut self, series: &mut TimeSeriesController) {
        self.cancel_timer();
        self.generation += 1;

        let token = CancellationToken::new();
        let task_token = token.clone();
        let commands = self.commands.clone();
        let wake = self.wake.clone();
        let period = self.interval;
        let generation = self.generation;

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = task_token.cancelled() => {
                        debug!("Animation timer {} cancelled", generation);
                        return;
                    }
                    _ = ticker.tick() => {
                        if commands.send(Command::Tick { generation }).is_err() {
                            return; // Viewer dropped
                        }
                        if let Some(wake) = &wake {
                            wake();
                        }
                    }
                }
            }
        });

        self.timer = Some(token);
        series.set_playing(true);
        info!("Animation started ({} ms interval)", self.interval.as_millis());
    }

    /// Stop ticking. Ticks already queued by the old timer become stale.
    pub fn stop(&mut self, series: &mut TimeSeriesController) {
        let was_running = self.cancel_timer();
        self.generation += 1;
        series.set_playing(false);
        if was_running {
            info!("Animation stopped");
        }
    }

    /// Whether a tick from `generation` belongs to the live timer.
    #[must_use]
    pub fn accepts(&self, generation: u64) -> bool {
        self.timer.is_some() && generation == self.generation
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RegionCatalog;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> (
        AnimationScheduler,
        TimeSeriesController,
        mpsc::UnboundedReceiver<Command>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = AnimationScheduler::new(DEFAULT_TICK_INTERVAL, tx);
        let series = TimeSeriesController::new(Arc::new(RegionCatalog::builtin()));
        (scheduler, series, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_starts_and_stops() {
        let (mut scheduler, mut series, _rx) = setup();

        assert!(scheduler.toggle_play(&mut series));
        assert!(series.is_playing());
        assert!(scheduler.is_running());

        assert!(!scheduler.toggle_play(&mut series));
        assert!(!series.is_playing());
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_fixed_interval() {
        let (mut scheduler, mut series, mut rx) = setup();
        let start = Instant::now();
        scheduler.start(&mut series);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, Command::Tick { generation } if scheduler.accepts(generation)));
        assert!(start.elapsed() >= DEFAULT_TICK_INTERVAL);
        assert!(start.elapsed() < DEFAULT_TICK_INTERVAL * 2);

        rx.recv().await.unwrap();
        assert!(start.elapsed() >= DEFAULT_TICK_INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let (mut scheduler, mut series, mut rx) = setup();
        scheduler.start(&mut series);
        rx.recv().await.unwrap();

        scheduler.stop(&mut series);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_timer() {
        let (mut scheduler, mut series, mut rx) = setup();
        scheduler.start(&mut series);
        let first_generation = scheduler.generation();
        scheduler.start(&mut series);
        assert_ne!(first_generation, scheduler.generation());

        // One timer only: exactly one tick per interval.
        tokio::time::sleep(DEFAULT_TICK_INTERVAL * 3 + Duration::from_millis(10)).await;
        let mut ticks = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            ticks.push(cmd);
        }
        assert_eq!(ticks.len(), 3);
        assert!(ticks
            .iter()
            .all(|c| matches!(c, Command::Tick { generation } if *generation == scheduler.generation())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_tick_is_stale_after_stop() {
        let (mut scheduler, mut series, mut rx) = setup();
        scheduler.start(&mut series);
        tokio::time::sleep(DEFAULT_TICK_INTERVAL + Duration::from_millis(10)).await;
        scheduler.stop(&mut series);

        let Some(Command::Tick { generation }) = rx.recv().await else {
            panic!("expected a queued tick");
        };
        assert!(!scheduler.accepts(generation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_called_per_tick() {
        let (mut scheduler, mut series, mut rx) = setup();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        scheduler.set_wake(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        scheduler.start(&mut series);

        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
    }
}
