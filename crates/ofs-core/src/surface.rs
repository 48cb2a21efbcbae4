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

//! The map surface the controllers draw onto.
//!
//! The desktop app implements this over walkers tiles; tests use a
//! recording double. All calls happen on the UI thread.

use crate::projection::LonLat;
use crate::source::{RemoteSource, SourceParams};

/// Opaque handle to a layer added to a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u32);

/// Layer container capable of rendering parameterized remote sources.
pub trait MapSurface {
    /// Add a layer rendering `source` on top of existing layers.
    fn add_layer(&mut self, source: RemoteSource) -> LayerId;

    /// Replace the layer's source, keeping its identity and draw order.
    fn set_source(&mut self, layer: LayerId, source: RemoteSource);

    /// The layer's current source.
    fn source(&self, layer: LayerId) -> Option<&RemoteSource>;

    /// Merge `params` into the layer's source and re-fetch its imagery.
    fn update_params(&mut self, layer: LayerId, params: SourceParams);

    fn set_visible(&mut self, layer: LayerId, visible: bool);

    fn is_visible(&self, layer: LayerId) -> bool;

    fn set_center(&mut self, center: LonLat);

    fn set_zoom(&mut self, zoom: f64);
}
