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

//! The map widget and its [`MapSurface`] implementation.
//!
//! Holds the walkers map state, the basemap and every overlay layer in draw
//! order. Screen/map conversion is done from the view center and zoom, so the
//! highlight and click handling don't depend on walkers internals.

use std::path::PathBuf;

use egui::{Color32, Pos2, Rect, Shape, Stroke};
use log::{debug, warn};
use ofs_core::projection::HALF_WORLD_M;
use ofs_core::{
    Geometry, HighlightFeature, LayerId, LonLat, MapSurface, Projected, RemoteSource, SourceParams,
    WebMercator,
};
use walkers::{lon_lat, HttpOptions, HttpTiles, Map, MapMemory, Position, Tiles};

use super::basemaps::{Basemap, BasemapSource};
use super::overlay::OverlayLayer;

const TILE_SIZE: f64 = 256.0;
const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(255, 200, 0);

/// Linear mapping between screen points and EPSG:3857 for the current view
#[derive(Debug, Clone, Copy)]
pub struct ScreenProjection {
    pub screen_center: Pos2,
    pub map_center: Projected,
    /// Screen points per projected metre
    pub scale: f64,
}

impl ScreenProjection {
    pub fn new(rect: Rect, center: LonLat, zoom: f64) -> Self {
        let world_px = TILE_SIZE * 2_f64.powf(zoom);
        Self {
            screen_center: rect.center(),
            map_center: WebMercator::from_lon_lat(center),
            scale: world_px / (2.0 * HALF_WORLD_M),
        }
    }

    #[allow(clippy::cast_possible_truncation, reason = "screen coordinates fit in f32")]
    pub fn to_screen(&self, point: Projected) -> Pos2 {
        let dx = (point.x - self.map_center.x) * self.scale;
        let dy = (point.y - self.map_center.y) * self.scale;
        // Screen y grows downward, projected y grows north
        Pos2::new(
            self.screen_center.x + dx as f32,
            self.screen_center.y - dy as f32,
        )
    }

    pub fn to_map(&self, pos: Pos2) -> Projected {
        let dx = f64::from(pos.x - self.screen_center.x) / self.scale;
        let dy = f64::from(self.screen_center.y - pos.y) / self.scale;
        Projected::new(self.map_center.x + dx, self.map_center.y + dy)
    }
}

/// What happened on the map during one frame
#[derive(Debug, Default)]
pub struct MapInteraction {
    pub clicked: Option<Projected>,
    pub projection: Option<ScreenProjection>,
}

pub struct MapView {
    ctx: egui::Context,
    memory: MapMemory,
    home: LonLat,
    basemap: Basemap,
    basemap_tiles: HttpTiles,
    layers: Vec<OverlayLayer>,
}

impl std::fmt::Debug for MapView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapView")
            .field("home", &self.home)
            .field("basemap", &self.basemap)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

fn basemap_cache_dir(basemap: Basemap) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("s111-viewer")
        .join("basemaps")
        .join(basemap.id())
}

fn basemap_tiles(basemap: Basemap, ctx: &egui::Context) -> HttpTiles {
    let http_options = HttpOptions {
        cache: Some(basemap_cache_dir(basemap)),
        ..Default::default()
    };
    HttpTiles::with_options(BasemapSource(basemap), http_options, ctx.clone())
}

fn to_position(lonlat: LonLat) -> Position {
    lon_lat(lonlat.lon, lonlat.lat)
}

impl MapView {
    pub fn new(ctx: &egui::Context, basemap: Basemap, home: LonLat) -> Self {
        Self {
            ctx: ctx.clone(),
            memory: MapMemory::default(),
            home,
            basemap,
            basemap_tiles: basemap_tiles(basemap, ctx),
            layers: Vec::new(),
        }
    }

    pub fn basemap(&self) -> Basemap {
        self.basemap
    }

    /// Swap the background map
    pub fn set_basemap(&mut self, basemap: Basemap) {
        if basemap != self.basemap {
            debug!("Switching basemap to {}", basemap.label());
            self.basemap = basemap;
            self.basemap_tiles = basemap_tiles(basemap, &self.ctx);
        }
    }

    /// Blend factor for an overlay (0.0 - 1.0)
    pub fn set_opacity(&mut self, layer: LayerId, opacity: f32) {
        if let Some(layer) = self.layer_mut(layer) {
            layer.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn layer_mut(&mut self, layer: LayerId) -> Option<&mut OverlayLayer> {
        let layer = self.layers.get_mut(layer.0 as usize);
        if layer.is_none() {
            warn!("Map call for a layer that was never added");
        }
        layer
    }

    /// Draw the map, its overlays and the highlight; report clicks
    pub fn show(&mut self, ui: &mut egui::Ui, highlight: Option<&HighlightFeature>) -> MapInteraction {
        let home = to_position(self.home);
        let basemap: &mut dyn Tiles = &mut self.basemap_tiles;
        let mut map = Map::new(Some(basemap), &mut self.memory, home);
        for layer in self.layers.iter_mut().filter(|l| l.visible) {
            map = map.with_layer(&mut layer.tiles, layer.opacity);
        }
        let response = ui.add(map);

        let center = self
            .memory
            .detached()
            .map_or(self.home, |p| LonLat::new(p.x(), p.y()));
        let projection = ScreenProjection::new(response.rect, center, self.memory.zoom());

        if let Some(feature) = highlight {
            draw_highlight(&ui.painter_at(response.rect), &projection, feature);
        }

        let clicked = if response.clicked() {
            response.interact_pointer_pos().map(|pos| projection.to_map(pos))
        } else {
            None
        };

        MapInteraction {
            clicked,
            projection: Some(projection),
        }
    }
}

fn draw_highlight(painter: &egui::Painter, projection: &ScreenProjection, feature: &HighlightFeature) {
    let stroke = Stroke::new(3.0, HIGHLIGHT_COLOR);
    match &feature.geometry {
        Geometry::Point(p) => {
            painter.circle_stroke(projection.to_screen(*p), 8.0, stroke);
        }
        Geometry::Polyline(paths) => {
            for path in paths {
                let points = path.iter().map(|p| projection.to_screen(*p)).collect();
                painter.add(Shape::line(points, stroke));
            }
        }
        Geometry::Polygon(rings) => {
            for ring in rings {
                let points = ring.iter().map(|p| projection.to_screen(*p)).collect();
                painter.add(Shape::closed_line(points, stroke));
            }
        }
    }
}

impl MapSurface for MapView {
    fn add_layer(&mut self, source: RemoteSource) -> LayerId {
        let id = LayerId(u32::try_from(self.layers.len()).unwrap_or(u32::MAX));
        let layer = OverlayLayer::new(source, "NOAA Office of Coast Survey", 1.0, &self.ctx);
        self.layers.push(layer);
        id
    }

    fn set_source(&mut self, layer: LayerId, source: RemoteSource) {
        let ctx = self.ctx.clone();
        if let Some(layer) = self.layer_mut(layer) {
            layer.refetch(source, &ctx);
        }
    }

    fn source(&self, layer: LayerId) -> Option<&RemoteSource> {
        self.layers.get(layer.0 as usize).map(|l| &l.source)
    }

    fn update_params(&mut self, layer: LayerId, params: SourceParams) {
        let ctx = self.ctx.clone();
        if let Some(layer) = self.layer_mut(layer) {
            let mut source = layer.source.clone();
            source.update_params(params);
            layer.refetch(source, &ctx);
        }
        self.ctx.request_repaint();
    }

    fn set_visible(&mut self, layer: LayerId, visible: bool) {
        if let Some(layer) = self.layer_mut(layer) {
            layer.visible = visible;
        }
    }

    fn is_visible(&self, layer: LayerId) -> bool {
        self.layers.get(layer.0 as usize).is_some_and(|l| l.visible)
    }

    fn set_center(&mut self, center: LonLat) {
        self.home = center;
        self.memory.center_at(to_position(center));
    }

    fn set_zoom(&mut self, zoom: f64) {
        if let Err(e) = self.memory.set_zoom(zoom) {
            warn!("Rejected zoom level {}: {:?}", zoom, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> ScreenProjection {
        let rect = Rect::from_min_size(Pos2::ZERO, egui::vec2(800.0, 600.0));
        ScreenProjection::new(rect, LonLat::new(-82.773, 27.557), 10.0)
    }

    #[test]
    fn test_center_maps_to_rect_center() {
        let p = projection();
        let center = WebMercator::from_lon_lat(LonLat::new(-82.773, 27.557));
        let screen = p.to_screen(center);
        assert!((screen.x - 400.0).abs() < 1e-3);
        assert!((screen.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_screen_round_trip() {
        let p = projection();
        let pos = Pos2::new(123.0, 456.0);
        let back = p.to_screen(p.to_map(pos));
        assert!((back.x - pos.x).abs() < 1e-2);
        assert!((back.y - pos.y).abs() < 1e-2);
    }

    #[test]
    fn test_north_is_up() {
        let p = projection();
        let north = Projected::new(p.map_center.x, p.map_center.y + 1000.0);
        assert!(p.to_screen(north).y < p.screen_center.y);
    }
}
