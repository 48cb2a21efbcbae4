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

//! Basemap tile sources.

use serde::{Deserialize, Serialize};
use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

const ESRI_IMAGERY: &str = "https://services.arcgisonline.com/arcgis/rest/services/World_Imagery/MapServer";
const ESRI_TOPO: &str = "https://services.arcgisonline.com/arcgis/rest/services/World_Topo_Map/MapServer";

/// Background maps offered by the basemap selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Basemap {
    #[default]
    #[serde(rename = "stamen")]
    #[value(name = "stamen")]
    Stamen,
    #[serde(rename = "osm")]
    #[value(name = "osm")]
    OpenStreetMap,
    #[serde(rename = "esri-sat")]
    #[value(name = "esri-sat")]
    EsriSatellite,
    #[serde(rename = "esri-topo")]
    #[value(name = "esri-topo")]
    EsriTopo,
}

impl Basemap {
    pub const ALL: [Basemap; 4] = [
        Basemap::Stamen,
        Basemap::OpenStreetMap,
        Basemap::EsriSatellite,
        Basemap::EsriTopo,
    ];

    /// Stable id used for the tile cache directory
    pub fn id(self) -> &'static str {
        match self {
            Basemap::Stamen => "stamen",
            Basemap::OpenStreetMap => "osm",
            Basemap::EsriSatellite => "esri-sat",
            Basemap::EsriTopo => "esri-topo",
        }
    }

    /// Get human-readable display name
    pub fn label(self) -> &'static str {
        match self {
            Basemap::Stamen => "Stamen",
            Basemap::OpenStreetMap => "OpenStreetMap",
            Basemap::EsriSatellite => "ESRI Satellite Imagery",
            Basemap::EsriTopo => "ESRI Topographic",
        }
    }
}

/// Tile source for one of the [`Basemap`] choices
#[derive(Debug, Clone, Copy)]
pub struct BasemapSource(pub Basemap);

impl TileSource for BasemapSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        match self.0 {
            Basemap::Stamen => format!(
                "http://tile.stamen.com/terrain/{}/{}/{}.jpg",
                tile_id.zoom, tile_id.x, tile_id.y
            ),
            Basemap::OpenStreetMap => format!(
                "https://tile.openstreetmap.org/{}/{}/{}.png",
                tile_id.zoom, tile_id.x, tile_id.y
            ),
            // ArcGIS tile services take row before column
            Basemap::EsriSatellite => format!("{ESRI_IMAGERY}/tile/{}/{}/{}", tile_id.zoom, tile_id.y, tile_id.x),
            Basemap::EsriTopo => format!("{ESRI_TOPO}/tile/{}/{}/{}", tile_id.zoom, tile_id.y, tile_id.x),
        }
    }

    fn attribution(&self) -> Attribution {
        let (text, url) = match self.0 {
            Basemap::Stamen => ("Map tiles by Stamen Design, under CC BY 3.0", "http://maps.stamen.com/"),
            Basemap::OpenStreetMap => ("© OpenStreetMap contributors", "https://www.openstreetmap.org/copyright"),
            Basemap::EsriSatellite | Basemap::EsriTopo => ("Tiles © Esri", "https://www.esri.com/"),
        };
        Attribution {
            text,
            url,
            logo_light: None,
            logo_dark: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> TileId {
        TileId { x: 3, y: 5, zoom: 4 }
    }

    #[test]
    fn test_xyz_urls() {
        assert_eq!(
            BasemapSource(Basemap::Stamen).tile_url(tile()),
            "http://tile.stamen.com/terrain/4/3/5.jpg"
        );
        assert_eq!(
            BasemapSource(Basemap::OpenStreetMap).tile_url(tile()),
            "https://tile.openstreetmap.org/4/3/5.png"
        );
    }

    #[test]
    fn test_esri_urls_swap_row_and_column() {
        let url = BasemapSource(Basemap::EsriTopo).tile_url(tile());
        assert!(url.ends_with("/World_Topo_Map/MapServer/tile/4/5/3"));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = Basemap::ALL.iter().map(|b| b.id()).collect();
        ids.dedup();
        assert_eq!(ids.len(), Basemap::ALL.len());
    }
}
