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

//! Web Mercator (EPSG:3857) projection helpers.
//!
//! Map clicks arrive in projected metres, region centers are stored as
//! longitude/latitude, and remote image requests are keyed by projected
//! extents, so all three meet here.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Spherical Mercator earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Half the width of the projected world in metres.
pub const HALF_WORLD_M: f64 = PI * EARTH_RADIUS_M;

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Coordinate in the map's projected frame (EPSG:3857 metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
}

impl Projected {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned projected extent: `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Comma-separated form used by WMS and ArcGIS `bbox` parameters.
    #[must_use]
    pub fn to_bbox_string(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// Web Mercator projection utilities
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Project longitude/latitude to EPSG:3857 metres.
    #[must_use]
    pub fn from_lon_lat(position: LonLat) -> Projected {
        let x = EARTH_RADIUS_M * position.lon.to_radians();
        let y = EARTH_RADIUS_M * (PI / 4.0 + position.lat.to_radians() / 2.0).tan().ln();
        Projected { x, y }
    }

    /// Inverse of [`WebMercator::from_lon_lat`].
    #[must_use]
    pub fn to_lon_lat(point: Projected) -> LonLat {
        let lon = (point.x / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (point.y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
        LonLat { lon, lat }
    }

    /// Projected extent covered by tile `(x, y)` at `zoom` (XYZ scheme, y down).
    #[must_use]
    pub fn tile_extent(x: u32, y: u32, zoom: u8) -> Extent {
        let n = 2_f64.powi(i32::from(zoom));
        let size = 2.0 * HALF_WORLD_M / n;
        let min_x = -HALF_WORLD_M + f64::from(x) * size;
        let max_y = HALF_WORLD_M - f64::from(y) * size;
        Extent {
            min_x,
            min_y: max_y - size,
            max_x: min_x + size,
            max_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_tampa_bay() {
        let center = LonLat::new(-82.773, 27.557);
        let projected = WebMercator::from_lon_lat(center);
        let back = WebMercator::to_lon_lat(projected);
        assert!((back.lon - center.lon).abs() < 1e-9);
        assert!((back.lat - center.lat).abs() < 1e-9);
    }

    #[test]
    fn test_origin_projects_to_zero() {
        let p = WebMercator::from_lon_lat(LonLat::new(0.0, 0.0));
        assert!(p.x.abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn test_zoom_zero_tile_covers_world() {
        let extent = WebMercator::tile_extent(0, 0, 0);
        assert!((extent.min_x + HALF_WORLD_M).abs() < 1e-6);
        assert!((extent.max_x - HALF_WORLD_M).abs() < 1e-6);
        assert!((extent.min_y + HALF_WORLD_M).abs() < 1e-6);
        assert!((extent.max_y - HALF_WORLD_M).abs() < 1e-6);
    }

    #[test]
    fn test_tile_extent_quadrant() {
        // Zoom 1, tile (1, 0) is the north-east quadrant.
        let extent = WebMercator::tile_extent(1, 0, 1);
        assert!(extent.min_x.abs() < 1e-6);
        assert!(extent.min_y.abs() < 1e-6);
        assert!((extent.max_x - HALF_WORLD_M).abs() < 1e-6);
    }
}
