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

//! Command dispatch.
//!
//! UI events become typed [`Command`]s consumed on the UI thread. Timer
//! ticks and identify responses come back through the same channel, so every
//! state change happens in one place and in arrival order.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::sync::mpsc;

use crate::binding::LayerBinding;
use crate::catalog::RegionCatalog;
use crate::identify::{
    ChartIndexService, FeatureSet, IdentifyConfig, IdentifyController, IdentifyError,
    IdentifyOutcome, ProductTab,
};
use crate::projection::Projected;
use crate::scheduler::{AnimationScheduler, WakeFn, DEFAULT_TICK_INTERVAL};
use crate::surface::MapSurface;
use crate::timeseries::TimeSeriesController;

/// Everything that can change viewer state.
#[derive(Debug, Clone)]
pub enum Command {
    SelectRegion(String),
    TogglePlay,
    SetForecastVisible(bool),
    /// Map click in EPSG:3857.
    MapClicked(Projected),
    SelectTab(ProductTab),
    ClosePopup,
    /// Animation timer fired.
    Tick { generation: u64 },
    /// Chart-index response arrived.
    QueryResolved {
        request: u64,
        anchor: Projected,
        response: Result<FeatureSet, IdentifyError>,
    },
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub tick_interval: Duration,
    pub identify: IdentifyConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            identify: IdentifyConfig::default(),
        }
    }
}

/// Owns the controllers and applies commands to them.
#[derive(Debug)]
pub struct Viewer<S> {
    catalog: Arc<RegionCatalog>,
    series: TimeSeriesController,
    scheduler: AnimationScheduler,
    binding: LayerBinding,
    identify: IdentifyController,
    service: Arc<S>,
    commands_tx: mpsc::UnboundedSender<Command>,
    commands_rx: mpsc::UnboundedReceiver<Command>,
}

impl<S: ChartIndexService> Viewer<S> {
    #[must_use]
    pub fn new(catalog: Arc<RegionCatalog>, service: Arc<S>, config: ViewerConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            series: TimeSeriesController::new(Arc::clone(&catalog)),
            scheduler: AnimationScheduler::new(config.tick_interval, commands_tx.clone()),
            binding: LayerBinding::new(Arc::clone(&catalog)),
            identify: IdentifyController::new(config.identify),
            catalog,
            service,
            commands_tx,
            commands_rx,
        }
    }

    /// Sender for UI code to post commands from callbacks.
    #[must_use]
    pub fn sender(&self) -> mpsc::UnboundedSender<Command> {
        self.commands_tx.clone()
    }

    /// Called whenever a background task queues a command.
    pub fn set_wake(&mut self, wake: WakeFn) {
        self.scheduler.set_wake(wake);
    }

    /// Apply one command.
    pub fn dispatch(&mut self, command: Command, surface: &mut dyn MapSurface) {
        match command {
            Command::SelectRegion(id) => {
                if let Err(e) =
                    self.binding
                        .bind_region(&id, &mut self.series, &mut self.scheduler, surface)
                {
                    debug!("Region switch aborted: {}", e);
                }
            }
            Command::TogglePlay => {
                if self.series.active_model().is_none() {
                    warn!("Play requested with no forecast model bound");
                    return;
                }
                self.scheduler.toggle_play(&mut self.series);
            }
            Command::SetForecastVisible(visible) => self.binding.set_visible(visible, surface),
            Command::MapClicked(point) => self.start_identify(point),
            Command::SelectTab(tab) => {
                self.identify.select_tab(tab);
            }
            Command::ClosePopup => self.identify.close(),
            Command::Tick { generation } => {
                if !self.scheduler.accepts(generation) {
                    debug!("Dropping stale tick from timer {}", generation);
                    return;
                }
                match self.series.advance(surface) {
                    Ok(_) => debug!("{}", self.series.display_label()),
                    Err(e) => error!("Animation tick failed: {}", e),
                }
            }
            Command::QueryResolved {
                request,
                anchor,
                response,
            } => {
                let tab = ProductTab::default_for(self.binding.is_visible(surface));
                if let IdentifyOutcome::Failed(e) =
                    self.identify.apply_response(request, anchor, response, tab)
                {
                    debug!("Identify left popup unchanged: {}", e);
                }
            }
        }
    }

    /// Apply every queued command without waiting. Returns how many ran.
    pub fn drain(&mut self, surface: &mut dyn MapSurface) -> usize {
        let mut count = 0;
        while let Ok(command) = self.commands_rx.try_recv() {
            self.dispatch(command, surface);
            count += 1;
        }
        count
    }

    /// Wait for the next queued command and apply it.
    ///
    /// Returns `false` once the channel is closed.
    pub async fn next(&mut self, surface: &mut dyn MapSurface) -> bool {
        match self.commands_rx.recv().await {
            Some(command) => {
                self.dispatch(command, surface);
                true
            }
            None => false,
        }
    }

    fn start_identify(&mut self, point: Projected) {
        let pending = self.identify.begin(point);
        let service = Arc::clone(&self.service);
        let commands = self.commands_tx.clone();

        tokio::spawn(async move {
            let response = service.query(pending.query).await;
            let resolved = Command::QueryResolved {
                request: pending.request,
                anchor: pending.anchor,
                response,
            };
            if commands.send(resolved).is_err() {
                debug!("Viewer closed before identify request {} resolved", pending.request);
            }
        });
    }

    #[must_use]
    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn series(&self) -> &TimeSeriesController {
        &self.series
    }

    #[must_use]
    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn binding(&self) -> &LayerBinding {
        &self.binding
    }

    #[must_use]
    pub fn identify(&self) -> &IdentifyController {
        &self.identify
    }
}
