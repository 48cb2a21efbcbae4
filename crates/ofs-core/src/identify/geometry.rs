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

//! Highlight geometry.
//!
//! Chart-index features come back as ArcGIS JSON geometries; the first
//! feature of a successful query is converted here and kept as the single
//! highlighted feature.

use serde_json::Value;

use crate::projection::{Extent, Projected};

/// Renderable geometry in EPSG:3857.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Projected),
    Polyline(Vec<Vec<Projected>>),
    Polygon(Vec<Vec<Projected>>),
}

fn parse_path(value: &Value) -> Option<Vec<Projected>> {
    value
        .as_array()?
        .iter()
        .map(|pair| {
            let pair = pair.as_array()?;
            Some(Projected::new(pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
        })
        .collect()
}

fn parse_paths(value: &Value) -> Option<Vec<Vec<Projected>>> {
    let paths: Vec<Vec<Projected>> = value
        .as_array()?
        .iter()
        .map(parse_path)
        .collect::<Option<_>>()?;
    if paths.is_empty() {
        None
    } else {
        Some(paths)
    }
}

impl Geometry {
    /// Convert an ArcGIS JSON geometry (`{x,y}`, `{paths}` or `{rings}`).
    #[must_use]
    pub fn from_esri_json(value: &Value) -> Option<Self> {
        if let Some(rings) = value.get("rings") {
            return parse_paths(rings).map(Geometry::Polygon);
        }
        if let Some(paths) = value.get("paths") {
            return parse_paths(paths).map(Geometry::Polyline);
        }
        let x = value.get("x")?.as_f64()?;
        let y = value.get("y")?.as_f64()?;
        Some(Geometry::Point(Projected::new(x, y)))
    }

    /// Every vertex of the geometry.
    pub fn vertices(&self) -> Box<dyn Iterator<Item = Projected> + '_> {
        match self {
            Geometry::Point(p) => Box::new(std::iter::once(*p)),
            Geometry::Polyline(parts) | Geometry::Polygon(parts) => {
                Box::new(parts.iter().flat_map(|part| part.iter().copied()))
            }
        }
    }

    #[must_use]
    pub fn extent(&self) -> Extent {
        let mut extent = Extent {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in self.vertices() {
            extent.min_x = extent.min_x.min(p.x);
            extent.min_y = extent.min_y.min(p.y);
            extent.max_x = extent.max_x.max(p.x);
            extent.max_y = extent.max_y.max(p.y);
        }
        extent
    }
}

/// The highlighted chart cell.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightFeature {
    pub geometry: Geometry,
}

/// Overlay holding at most one highlighted feature.
#[derive(Debug, Default)]
pub struct HighlightLayer {
    feature: Option<HighlightFeature>,
}

impl HighlightLayer {
    /// Show `feature`, dropping whatever was highlighted before.
    pub fn replace(&mut self, feature: HighlightFeature) {
        self.feature = Some(feature);
    }

    pub fn clear(&mut self) {
        self.feature = None;
    }

    #[must_use]
    pub fn feature(&self) -> Option<&HighlightFeature> {
        self.feature.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.feature.is_some())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feature.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_polygon() {
        let geometry = Geometry::from_esri_json(&json!({
            "rings": [[[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 0.0]]],
            "spatialReference": {"wkid": 3857}
        }))
        .unwrap();
        let Geometry::Polygon(rings) = &geometry else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].len(), 4);
        let extent = geometry.extent();
        assert_eq!((extent.min_x, extent.max_x, extent.max_y), (0.0, 10.0, 5.0));
    }

    #[test]
    fn test_parse_point_and_polyline() {
        assert_eq!(
            Geometry::from_esri_json(&json!({"x": 1.5, "y": -2.0})),
            Some(Geometry::Point(Projected::new(1.5, -2.0)))
        );
        assert!(matches!(
            Geometry::from_esri_json(&json!({"paths": [[[0, 0], [1, 1]]]})),
            Some(Geometry::Polyline(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Geometry::from_esri_json(&Value::Null), None);
        assert_eq!(Geometry::from_esri_json(&json!({"rings": []})), None);
        assert_eq!(Geometry::from_esri_json(&json!({"rings": [[["a", 1]]]})), None);
    }

    #[test]
    fn test_highlight_layer_holds_one() {
        let mut layer = HighlightLayer::default();
        assert!(layer.is_empty());
        layer.replace(HighlightFeature {
            geometry: Geometry::Point(Projected::new(0.0, 0.0)),
        });
        layer.replace(HighlightFeature {
            geometry: Geometry::Point(Projected::new(1.0, 1.0)),
        });
        assert_eq!(layer.len(), 1);
        assert_eq!(
            layer.feature().unwrap().geometry,
            Geometry::Point(Projected::new(1.0, 1.0))
        );
        layer.clear();
        assert_eq!(layer.len(), 0);
    }
}
