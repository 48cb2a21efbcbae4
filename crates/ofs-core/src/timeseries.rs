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

//! Forecast valid-time state.
//!
//! [`TimeSeriesController`] owns the single [`AnimationState`] of the session.
//! It is reset on every region switch and advanced by the animation
//! scheduler's ticks, pushing each new valid time into the bound forecast
//! layer's `time` parameter.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use thiserror::Error;

use crate::catalog::{ForecastModel, RegionCatalog};
use crate::source::{format_time_param, RemoteSource, SourceParams, TIME_PARAM};
use crate::surface::{LayerId, MapSurface};

/// Errors raised by the time-series controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeSeriesError {
    #[error("unknown forecast model: {0}")]
    UnknownModel(String),

    #[error("no active forecast model")]
    InvalidState,

    #[error("next valid time of {0} is out of range")]
    TimeOutOfRange(String),
}

/// Animation state for the active forecast model.
#[derive(Debug, Clone)]
pub struct AnimationState {
    pub current_time: DateTime<Utc>,
    pub is_playing: bool,
    pub active_model: Option<ForecastModel>,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            current_time: DateTime::<Utc>::UNIX_EPOCH,
            is_playing: false,
            active_model: None,
        }
    }
}

/// Render a valid time the way browsers print `Date.toGMTString()`.
#[must_use]
pub fn format_gmt(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[derive(Debug)]
pub struct TimeSeriesController {
    catalog: Arc<RegionCatalog>,
    state: AnimationState,
    layer: Option<LayerId>,
}

impl TimeSeriesController {
    #[must_use]
    pub fn new(catalog: Arc<RegionCatalog>) -> Self {
        Self {
            catalog,
            state: AnimationState::default(),
            layer: None,
        }
    }

    /// Make `model` active and rewind to its start time.
    ///
    /// The start time is written into the model's own source parameters; the
    /// caller hands that source to the map (see [`Self::source`]).
    pub fn reset(&mut self, model: &ForecastModel) -> Result<(), TimeSeriesError> {
        if !self.catalog.contains(&model.region_id) {
            return Err(TimeSeriesError::UnknownModel(model.region_id.clone()));
        }

        let mut model = model.clone();
        model.source.set_time(model.start_time);
        self.state.current_time = model.start_time;
        self.state.active_model = Some(model);

        debug!("Time series reset: {}", self.display_label());
        Ok(())
    }

    /// Step to the next valid time, wrapping to the start once the end is reached.
    ///
    /// Wraparound is decided on the current value, so with a step that does not
    /// divide the span evenly the last frame lands past `end_time` and is still
    /// shown before the following call wraps.
    pub fn advance(&mut self, surface: &mut dyn MapSurface) -> Result<DateTime<Utc>, TimeSeriesError> {
        let model = self
            .state
            .active_model
            .as_mut()
            .ok_or(TimeSeriesError::InvalidState)?;

        let next = if self.state.current_time >= model.end_time {
            model.start_time
        } else {
            self.state
                .current_time
                .checked_add_signed(model.step)
                .ok_or_else(|| TimeSeriesError::TimeOutOfRange(model.region_id.clone()))?
        };

        self.state.current_time = next;
        model.source.set_time(next);

        if let Some(layer) = self.layer {
            let mut params = SourceParams::new();
            params.insert(TIME_PARAM.to_owned(), format_time_param(next));
            surface.update_params(layer, params);
        }

        Ok(next)
    }

    /// Attach the forecast layer that receives time updates.
    pub fn bind_layer(&mut self, layer: LayerId) {
        self.layer = Some(layer);
    }

    #[must_use]
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    /// The active model's source, with `time` set to the current valid time.
    #[must_use]
    pub fn source(&self) -> Option<&RemoteSource> {
        self.state.active_model.as_ref().map(|m| &m.source)
    }

    /// Current valid time in GMT, e.g. `Tue, 31 Dec 2019 19:00:00 GMT`.
    #[must_use]
    pub fn label(&self) -> String {
        format_gmt(self.state.current_time)
    }

    #[must_use]
    pub fn display_label(&self) -> String {
        format!("Valid Time: {}", self.label())
    }

    #[must_use]
    pub fn current_time(&self) -> DateTime<Utc> {
        self.state.current_time
    }

    #[must_use]
    pub fn active_model(&self) -> Option<&ForecastModel> {
        self.state.active_model.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
    }

    /// Zero-based frame of the current valid time.
    #[must_use]
    pub fn frame_index(&self) -> u32 {
        let Some(model) = &self.state.active_model else {
            return 0;
        };
        let step = model.step.num_milliseconds();
        if step <= 0 {
            return 0;
        }
        let offset = (self.state.current_time - model.start_time).num_milliseconds();
        u32::try_from(offset / step).unwrap_or(0)
    }

    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.state
            .active_model
            .as_ref()
            .map_or(0, ForecastModel::frame_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSurface;
    use chrono::TimeZone;

    fn controller() -> TimeSeriesController {
        TimeSeriesController::new(Arc::new(RegionCatalog::builtin()))
    }

    fn cbofs() -> ForecastModel {
        RegionCatalog::builtin().model("cbofs").unwrap().clone()
    }

    #[test]
    fn test_advance_without_model_is_invalid() {
        let mut ts = controller();
        let mut surface = RecordingSurface::default();
        assert_eq!(ts.advance(&mut surface), Err(TimeSeriesError::InvalidState));
        assert_eq!(surface.update_count(), 0);
    }

    #[test]
    fn test_reset_sets_start_and_time_param() {
        let mut ts = controller();
        ts.reset(&cbofs()).unwrap();
        assert_eq!(ts.current_time(), Utc.with_ymd_and_hms(2019, 12, 31, 19, 0, 0).unwrap());
        assert_eq!(ts.source().unwrap().time(), Some("2019-12-31T19:00:00.000Z"));
        assert_eq!(ts.label(), "Tue, 31 Dec 2019 19:00:00 GMT");
        assert_eq!(ts.display_label(), "Valid Time: Tue, 31 Dec 2019 19:00:00 GMT");
    }

    #[test]
    fn test_reset_unknown_model_leaves_state() {
        let mut ts = controller();
        ts.reset(&cbofs()).unwrap();
        let mut surface = RecordingSurface::default();
        ts.advance(&mut surface).unwrap();
        let before = ts.current_time();

        let mut bogus = cbofs();
        bogus.region_id = "atlantis".to_owned();
        assert_eq!(
            ts.reset(&bogus),
            Err(TimeSeriesError::UnknownModel("atlantis".to_owned()))
        );
        assert_eq!(ts.current_time(), before);
        assert_eq!(ts.active_model().unwrap().region_id, "cbofs");
    }

    #[test]
    fn test_cbofs_wraps_after_47_steps() {
        let mut ts = controller();
        let mut surface = RecordingSurface::default();
        ts.reset(&cbofs()).unwrap();

        for _ in 0..47 {
            ts.advance(&mut surface).unwrap();
        }
        assert_eq!(ts.current_time(), Utc.with_ymd_and_hms(2020, 1, 2, 18, 0, 0).unwrap());
        assert_eq!(ts.frame_index(), 47);

        ts.advance(&mut surface).unwrap();
        assert_eq!(ts.current_time(), Utc.with_ymd_and_hms(2019, 12, 31, 19, 0, 0).unwrap());
        assert_eq!(ts.frame_index(), 0);
    }

    #[test]
    fn test_every_model_reaches_end_then_wraps() {
        let catalog = RegionCatalog::builtin();
        for region in catalog.regions() {
            let model = catalog.model(&region.id).unwrap();
            let mut ts = controller();
            let mut surface = RecordingSurface::default();
            ts.reset(model).unwrap();

            let span = (model.end_time - model.start_time).num_milliseconds();
            let step = model.step.num_milliseconds();
            let bound = (span + step - 1) / step;

            let mut calls = 0;
            while ts.current_time() < model.end_time {
                ts.advance(&mut surface).unwrap();
                calls += 1;
                assert!(calls <= bound, "{} did not reach its end time", region.id);
            }
            ts.advance(&mut surface).unwrap();
            assert_eq!(ts.current_time(), model.start_time, "{}", region.id);
        }
    }

    #[test]
    fn test_uneven_step_overshoots_before_wrapping() {
        let catalog = RegionCatalog::builtin();
        let model = catalog.model("sfbofs").unwrap();
        let mut ts = controller();
        let mut surface = RecordingSurface::default();
        ts.reset(model).unwrap();

        for _ in 0..24 {
            ts.advance(&mut surface).unwrap();
        }
        // 24 two-hour steps from 19:00 lands one hour past the 18:00 end.
        assert_eq!(ts.current_time(), Utc.with_ymd_and_hms(2020, 1, 2, 19, 0, 0).unwrap());
        ts.advance(&mut surface).unwrap();
        assert_eq!(ts.current_time(), model.start_time);
    }

    #[test]
    fn test_advance_past_calendar_is_an_error() {
        let mut model = cbofs();
        model.step = chrono::Duration::try_days(1_000_000_000).unwrap();
        let mut ts = controller();
        let mut surface = RecordingSurface::default();
        ts.reset(&model).unwrap();
        let layer = surface.add_layer(ts.source().unwrap().clone());
        ts.bind_layer(layer);

        assert_eq!(
            ts.advance(&mut surface),
            Err(TimeSeriesError::TimeOutOfRange("cbofs".to_owned()))
        );
        assert_eq!(ts.current_time(), model.start_time);
        assert_eq!(surface.update_count(), 0);
    }

    #[test]
    fn test_advance_pushes_time_to_bound_layer() {
        let mut ts = controller();
        let mut surface = RecordingSurface::default();
        ts.reset(&cbofs()).unwrap();
        let layer = surface.add_layer(ts.source().unwrap().clone());
        ts.bind_layer(layer);

        ts.advance(&mut surface).unwrap();
        ts.advance(&mut surface).unwrap();

        let recorded = surface.layer(layer);
        assert_eq!(recorded.updates.len(), 2);
        assert_eq!(recorded.updates[1].as_deref(), Some("2019-12-31T21:00:00.000Z"));
        assert_eq!(recorded.source.time(), Some("2019-12-31T21:00:00.000Z"));
    }
}
