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

//! Remote image overlays rendered as tiles.
//!
//! WMS and ArcGIS export endpoints answer arbitrary extents, so each map tile
//! is requested as its own 256x256 image covering that tile's extent.

use ofs_core::{RemoteSource, WebMercator};
use walkers::sources::{Attribution, TileSource};
use walkers::{HttpOptions, HttpTiles, TileId};

const TILE_SIZE: u32 = 256;

/// Adapts a [`RemoteSource`] to walkers' tile interface
#[derive(Debug, Clone)]
pub struct RemoteTileSource {
    source: RemoteSource,
    attribution: &'static str,
}

impl RemoteTileSource {
    pub fn new(source: RemoteSource, attribution: &'static str) -> Self {
        Self { source, attribution }
    }
}

impl TileSource for RemoteTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        let extent = WebMercator::tile_extent(tile_id.x, tile_id.y, tile_id.zoom);
        self.source.request_url(extent, TILE_SIZE, TILE_SIZE)
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: self.attribution,
            url: "https://nauticalcharts.noaa.gov/",
            logo_light: None,
            logo_dark: None,
        }
    }
}

/// One overlay on the map: its source, the tiles fetched for it, and display state
pub struct OverlayLayer {
    pub source: RemoteSource,
    pub tiles: HttpTiles,
    pub visible: bool,
    pub opacity: f32,
    attribution: &'static str,
}

impl std::fmt::Debug for OverlayLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayLayer")
            .field("endpoint", &self.source.endpoint())
            .field("visible", &self.visible)
            .field("opacity", &self.opacity)
            .finish_non_exhaustive()
    }
}

impl OverlayLayer {
    pub fn new(source: RemoteSource, attribution: &'static str, opacity: f32, ctx: &egui::Context) -> Self {
        let tiles = Self::fetch(&source, attribution, ctx);
        Self {
            source,
            tiles,
            visible: true,
            opacity,
            attribution,
        }
    }

    /// Replace the source and start fetching its imagery
    pub fn refetch(&mut self, source: RemoteSource, ctx: &egui::Context) {
        self.tiles = Self::fetch(&source, self.attribution, ctx);
        self.source = source;
    }

    fn fetch(source: &RemoteSource, attribution: &'static str, ctx: &egui::Context) -> HttpTiles {
        // Frames are keyed by time and change every tick; skip the disk cache.
        let http_options = HttpOptions {
            cache: None,
            ..Default::default()
        };
        HttpTiles::with_options(
            RemoteTileSource::new(source.clone(), attribution),
            http_options,
            ctx.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ofs_core::SourceProtocol;

    #[test]
    fn test_tile_url_uses_tile_extent() {
        let source = RemoteSource::new("https://example.test/wms", SourceProtocol::Wms)
            .with_param("layers", "s100ofs_Geo:cbofs");
        let tiles = RemoteTileSource::new(source, "test");
        let url = tiles.tile_url(TileId { x: 0, y: 0, zoom: 0 });
        assert!(url.contains("WIDTH=256"));
        assert!(url.contains("HEIGHT=256"));
        // Whole-world extent at zoom 0
        assert!(url.contains("BBOX=-20037508.34"));
    }
}
