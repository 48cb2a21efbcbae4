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

//! Forecast layer binding.
//!
//! Keeps exactly one forecast layer on the map for the whole session. Region
//! switches stop the animation, rewind the time series and swap the layer's
//! source in place, so the layer keeps its draw order and visibility wiring.

use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;

use crate::catalog::RegionCatalog;
use crate::scheduler::AnimationScheduler;
use crate::surface::{LayerId, MapSurface};
use crate::timeseries::{TimeSeriesController, TimeSeriesError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("unknown forecast model: {0}")]
    UnknownModel(String),

    #[error(transparent)]
    TimeSeries(#[from] TimeSeriesError),
}

#[derive(Debug)]
pub struct LayerBinding {
    catalog: Arc<RegionCatalog>,
    layer: Option<LayerId>,
    region: Option<String>,
}

impl LayerBinding {
    #[must_use]
    pub fn new(catalog: Arc<RegionCatalog>) -> Self {
        Self {
            catalog,
            layer: None,
            region: None,
        }
    }

    /// Point the forecast layer at `region_id`'s model and move the view there.
    ///
    /// An unknown id is logged and leaves the map, the animation and the time
    /// series exactly as they were.
    pub fn bind_region(
        &mut self,
        region_id: &str,
        series: &mut TimeSeriesController,
        scheduler: &mut AnimationScheduler,
        surface: &mut dyn MapSurface,
    ) -> Result<(), BindError> {
        let (Some(region), Some(model)) = (self.catalog.region(region_id), self.catalog.model(region_id))
        else {
            warn!("Ignoring unknown region: {}", region_id);
            return Err(BindError::UnknownModel(region_id.to_owned()));
        };

        scheduler.stop(series);
        series.reset(model)?;

        let Some(source) = series.source().cloned() else {
            return Err(TimeSeriesError::InvalidState.into());
        };

        match self.layer {
            None => {
                let layer = surface.add_layer(source);
                series.bind_layer(layer);
                self.layer = Some(layer);
            }
            Some(layer) => {
                surface.set_source(layer, source);
                if !surface.is_visible(layer) {
                    surface.set_visible(layer, true);
                }
            }
        }

        surface.set_center(region.center);
        surface.set_zoom(region.zoom);
        self.region = Some(region.id.clone());

        info!("Bound forecast layer to {} ({})", region.label, region.id);
        Ok(())
    }

    /// Show or hide the forecast layer without touching the animation.
    pub fn set_visible(&self, visible: bool, surface: &mut dyn MapSurface) {
        if let Some(layer) = self.layer {
            surface.set_visible(layer, visible);
        }
    }

    #[must_use]
    pub fn is_visible(&self, surface: &dyn MapSurface) -> bool {
        self.layer.is_some_and(|layer| surface.is_visible(layer))
    }

    #[must_use]
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    /// Id of the region currently bound.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::DEFAULT_TICK_INTERVAL;
    use crate::testing::RecordingSurface;
    use crate::viewer::Command;
    use tokio::sync::mpsc;

    struct Fixture {
        binding: LayerBinding,
        series: TimeSeriesController,
        scheduler: AnimationScheduler,
        surface: RecordingSurface,
        _rx: mpsc::UnboundedReceiver<Command>,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(RegionCatalog::builtin());
        let (tx, rx) = mpsc::unbounded_channel();
        Fixture {
            binding: LayerBinding::new(Arc::clone(&catalog)),
            series: TimeSeriesController::new(catalog),
            scheduler: AnimationScheduler::new(DEFAULT_TICK_INTERVAL, tx),
            surface: RecordingSurface::default(),
            _rx: rx,
        }
    }

    impl Fixture {
        fn bind(&mut self, id: &str) -> Result<(), BindError> {
            self.binding
                .bind_region(id, &mut self.series, &mut self.scheduler, &mut self.surface)
        }
    }

    #[test]
    fn test_bind_every_region_labels_start_time() {
        let catalog = RegionCatalog::builtin();
        let mut f = fixture();
        for region in catalog.regions() {
            f.bind(&region.id).unwrap();
            let start = catalog.model(&region.id).unwrap().start_time;
            assert_eq!(f.series.label(), crate::timeseries::format_gmt(start));
            assert_eq!(f.surface.center, Some(region.center));
            assert_eq!(f.surface.zoom, Some(region.zoom));
        }
    }

    #[test]
    fn test_single_layer_reused_across_switches() {
        let mut f = fixture();
        f.bind("cbofs").unwrap();
        f.bind("dbofs").unwrap();
        f.bind("tbofs").unwrap();

        assert_eq!(f.surface.layers.len(), 1);
        assert_eq!(f.surface.set_source_calls, 2);
        let layer = f.binding.layer().unwrap();
        assert_eq!(
            f.surface.layer(layer).source.params().get("layers").map(String::as_str),
            Some("s100ofs_Geo:tbofs")
        );
        assert_eq!(
            f.surface.layer(layer).source.time(),
            Some("2018-07-11T13:00:00.000Z")
        );
        assert_eq!(f.binding.region(), Some("tbofs"));
    }

    #[test]
    fn test_unknown_region_leaves_view_unchanged() {
        let mut f = fixture();
        f.bind("cbofs").unwrap();
        let center = f.surface.center;

        assert_eq!(f.bind("atlantis"), Err(BindError::UnknownModel("atlantis".into())));
        assert_eq!(f.surface.center, center);
        assert_eq!(f.binding.region(), Some("cbofs"));
        assert_eq!(f.series.active_model().unwrap().region_id, "cbofs");
    }

    #[test]
    fn test_switch_restores_hidden_layer() {
        let mut f = fixture();
        f.bind("cbofs").unwrap();
        f.binding.set_visible(false, &mut f.surface);
        assert!(!f.binding.is_visible(&f.surface));

        f.bind("nyofs").unwrap();
        assert!(f.binding.is_visible(&f.surface));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_stops_animation() {
        let mut f = fixture();
        f.bind("cbofs").unwrap();
        f.scheduler.start(&mut f.series);
        assert!(f.series.is_playing());

        f.bind("dbofs").unwrap();
        assert!(!f.series.is_playing());
        assert!(!f.scheduler.is_running());
    }

    #[test]
    fn test_visibility_without_layer_is_noop() {
        let mut f = fixture();
        f.binding.set_visible(false, &mut f.surface);
        assert!(f.surface.layers.is_empty());
        assert!(!f.binding.is_visible(&f.surface));
    }
}
