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

//! Chart identify controller.
//!
//! A map click starts a point query against the chart index. The first
//! feature of a successful response becomes the highlighted cell and its
//! attributes feed a tabbed popup anchored at the click. Empty responses
//! change nothing; failures are logged and leave the popup as it was.
//!
//! Responses are applied in arrival order. With
//! [`IdentifyConfig::discard_stale`] set, a response older than the newest
//! one already applied (or older than the last close) is dropped instead.

mod geometry;
mod products;
mod query;

pub use geometry::{Geometry, HighlightFeature, HighlightLayer};
pub use products::{AttributeTable, ProductTab};
pub use query::{
    AttributeValue, Attributes, ChartIndexQuery, ChartIndexService, Feature, FeatureSet,
    IdentifyError, SpatialRelation,
};

use log::{debug, info, warn};

use crate::projection::Projected;

/// Identify behaviour switches.
#[derive(Debug, Clone, Default)]
pub struct IdentifyConfig {
    /// Drop responses that arrive after a newer one was applied.
    pub discard_stale: bool,
    /// Fields requested from the chart index; empty means all.
    pub out_fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifyState {
    /// No popup.
    #[default]
    Idle,
    /// At least one query in flight.
    Querying,
    /// Popup displayed with a feature highlighted.
    Shown,
}

/// Attributes of the most recently identified chart cell.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifyResult {
    pub raw_geometry: serde_json::Value,
    pub attributes: Attributes,
}

/// A query ready to be sent.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    pub request: u64,
    pub anchor: Projected,
    pub query: ChartIndexQuery,
}

/// What a response did to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifyOutcome {
    Shown,
    Empty,
    Failed(IdentifyError),
    Stale,
}

/// Popup contents for the active tab.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub anchor: Projected,
    pub active_tab: ProductTab,
    pub table: AttributeTable,
}

#[derive(Debug, Default)]
pub struct IdentifyController {
    config: IdentifyConfig,
    state: IdentifyState,
    result: Option<IdentifyResult>,
    highlight: HighlightLayer,
    anchor: Option<Projected>,
    active_tab: Option<ProductTab>,
    next_request: u64,
    in_flight: usize,
    /// Responses at or below this request id are stale (when discarding).
    stale_below: u64,
}

impl IdentifyController {
    #[must_use]
    pub fn new(config: IdentifyConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Start identifying the chart cell under `point`.
    pub fn begin(&mut self, point: Projected) -> PendingQuery {
        self.next_request += 1;
        self.in_flight += 1;
        self.state = IdentifyState::Querying;

        debug!("Identify request {} at ({:.1}, {:.1})", self.next_request, point.x, point.y);
        PendingQuery {
            request: self.next_request,
            anchor: point,
            query: ChartIndexQuery::at(point).with_out_fields(self.config.out_fields.clone()),
        }
    }

    /// Apply the response to request `request`.
    pub fn apply_response(
        &mut self,
        request: u64,
        anchor: Projected,
        response: Result<FeatureSet, IdentifyError>,
        default_tab: ProductTab,
    ) -> IdentifyOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.config.discard_stale && request <= self.stale_below {
            debug!("Discarding stale identify response {}", request);
            self.settle();
            return IdentifyOutcome::Stale;
        }

        let outcome = match response.and_then(first_feature) {
            Ok((geometry, feature)) => {
                self.highlight.replace(HighlightFeature { geometry });
                self.result = Some(IdentifyResult {
                    raw_geometry: feature.geometry,
                    attributes: feature.attributes,
                });
                self.anchor = Some(anchor);
                self.active_tab = Some(default_tab);
                self.stale_below = self.stale_below.max(request);
                info!("Identified chart cell (request {})", request);
                IdentifyOutcome::Shown
            }
            Err(IdentifyError::QueryEmpty) => {
                debug!("Identify request {} returned no features", request);
                IdentifyOutcome::Empty
            }
            Err(e) => {
                warn!("Identify request {} failed: {}", request, e);
                IdentifyOutcome::Failed(e)
            }
        };

        self.settle();
        outcome
    }

    /// Switch the popup tab. Re-renders from the cached result; no query.
    pub fn select_tab(&mut self, tab: ProductTab) -> bool {
        if self.result.is_none() {
            return false;
        }
        self.active_tab = Some(tab);
        true
    }

    /// Dismiss the popup and clear the highlight.
    ///
    /// Requests already sent still count as in flight until they resolve.
    pub fn close(&mut self) {
        self.highlight.clear();
        self.result = None;
        self.anchor = None;
        self.active_tab = None;
        self.stale_below = self.next_request;
        self.settle();
    }

    #[must_use]
    pub fn state(&self) -> IdentifyState {
        self.state
    }

    #[must_use]
    pub fn result(&self) -> Option<&IdentifyResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn highlight(&self) -> &HighlightLayer {
        &self.highlight
    }

    #[must_use]
    pub fn active_tab(&self) -> Option<ProductTab> {
        self.active_tab
    }

    #[must_use]
    pub fn popup(&self) -> Option<Popup> {
        let result = self.result.as_ref()?;
        let anchor = self.anchor?;
        let active_tab = self.active_tab?;
        Some(Popup {
            anchor,
            active_tab,
            table: active_tab.render(&result.attributes),
        })
    }

    fn settle(&mut self) {
        self.state = if self.in_flight > 0 {
            IdentifyState::Querying
        } else if self.result.is_some() {
            IdentifyState::Shown
        } else {
            IdentifyState::Idle
        };
    }
}

fn first_feature(set: FeatureSet) -> Result<(Geometry, Feature), IdentifyError> {
    let feature = set
        .features
        .into_iter()
        .next()
        .ok_or(IdentifyError::QueryEmpty)?;
    let geometry = Geometry::from_esri_json(&feature.geometry)
        .ok_or_else(|| IdentifyError::Malformed("feature has no usable geometry".to_owned()))?;
    Ok((geometry, feature))
}
