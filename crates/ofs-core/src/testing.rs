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

//! Test doubles shared by the controller tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::identify::{ChartIndexQuery, ChartIndexService, FeatureSet, IdentifyError};
use crate::projection::LonLat;
use crate::source::{RemoteSource, SourceParams};
use crate::surface::{LayerId, MapSurface};

#[derive(Debug)]
pub(crate) struct RecordedLayer {
    pub source: RemoteSource,
    pub visible: bool,
    /// `update_params` calls, each with the `time` it pushed.
    pub updates: Vec<Option<String>>,
}

/// In-memory surface recording every call.
#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    pub layers: Vec<RecordedLayer>,
    pub set_source_calls: usize,
    pub center: Option<LonLat>,
    pub zoom: Option<f64>,
}

impl RecordingSurface {
    pub fn layer(&self, id: LayerId) -> &RecordedLayer {
        &self.layers[id.0 as usize]
    }

    pub fn update_count(&self) -> usize {
        self.layers.iter().map(|l| l.updates.len()).sum()
    }

    /// Number of `update_params` calls made on `layer`.
    pub fn updates_for(&self, layer: LayerId) -> usize {
        self.layer(layer).updates.len()
    }
}

impl MapSurface for RecordingSurface {
    fn add_layer(&mut self, source: RemoteSource) -> LayerId {
        self.layers.push(RecordedLayer {
            source,
            visible: true,
            updates: Vec::new(),
        });
        LayerId(u32::try_from(self.layers.len() - 1).unwrap())
    }

    fn set_source(&mut self, layer: LayerId, source: RemoteSource) {
        self.set_source_calls += 1;
        self.layers[layer.0 as usize].source = source;
    }

    fn source(&self, layer: LayerId) -> Option<&RemoteSource> {
        self.layers.get(layer.0 as usize).map(|l| &l.source)
    }

    fn update_params(&mut self, layer: LayerId, params: SourceParams) {
        let entry = &mut self.layers[layer.0 as usize];
        entry.source.update_params(params);
        entry.updates.push(entry.source.time().map(str::to_owned));
    }

    fn set_visible(&mut self, layer: LayerId, visible: bool) {
        self.layers[layer.0 as usize].visible = visible;
    }

    fn is_visible(&self, layer: LayerId) -> bool {
        self.layers.get(layer.0 as usize).is_some_and(|l| l.visible)
    }

    fn set_center(&mut self, center: LonLat) {
        self.center = Some(center);
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = Some(zoom);
    }
}

/// Chart-index stub answering from a fixed table keyed by rounded x.
#[derive(Debug, Default, Clone)]
pub(crate) struct StubChartIndex {
    responses: Arc<Mutex<HashMap<i64, Result<FeatureSet, IdentifyError>>>>,
    pub calls: Arc<AtomicUsize>,
}

impl StubChartIndex {
    pub fn respond(&self, x: f64, response: Result<FeatureSet, IdentifyError>) {
        #[allow(clippy::cast_possible_truncation, reason = "test keys are whole metres")]
        let key = x.round() as i64;
        self.responses.lock().unwrap().insert(key, response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChartIndexService for StubChartIndex {
    fn query(
        &self,
        query: ChartIndexQuery,
    ) -> impl std::future::Future<Output = Result<FeatureSet, IdentifyError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        #[allow(clippy::cast_possible_truncation, reason = "test keys are whole metres")]
        let key = query.point.x.round() as i64;
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(FeatureSet::default()));
        async move { response }
    }
}
