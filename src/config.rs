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

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format:
//! the startup region, basemap and layer visibility, animation cadence, the
//! chart-index endpoint, and optional custom forecast regions.

use std::time::Duration;

use ofs_core::{CatalogEntry, CatalogError, IdentifyConfig, RegionCatalog, ViewerConfig};
use serde::{Deserialize, Serialize};

use crate::map::Basemap;

const APP_NAME: &str = "s111-viewer";
const CONFIG_NAME: &str = "config";

/// Default chart-index query endpoint (ArcGIS REST layer `query`)
pub const DEFAULT_CHART_INDEX_URL: &str =
    "https://encdirect.noaa.gov/arcgis/rest/services/encdirect/enc_coverage/MapServer/2/query";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Region shown at startup
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Background basemap
    #[serde(default)]
    pub basemap: Basemap,

    /// Milliseconds between animation frames
    #[serde(default = "default_animation_interval_ms")]
    pub animation_interval_ms: u64,

    /// Start animating as soon as the first region is bound
    #[serde(default)]
    pub autoplay: bool,

    /// Show the ENC chart overlay
    #[serde(default = "default_true")]
    pub show_enc: bool,

    /// Show the surface-current forecast overlay
    #[serde(default = "default_true")]
    pub show_forecast: bool,

    /// Forecast layer opacity (0.0 - 1.0)
    #[serde(default = "default_forecast_opacity")]
    pub forecast_opacity: f32,

    /// Chart-index query endpoint used by identify
    #[serde(default = "default_chart_index_url")]
    pub chart_index_url: String,

    /// Fields requested from the chart index (empty = all)
    #[serde(default)]
    pub identify_out_fields: Vec<String>,

    /// Drop identify responses that arrive after a newer one
    #[serde(default)]
    pub discard_stale_identify: bool,

    /// Custom forecast regions; the built-in catalog is used when empty
    #[serde(default)]
    pub regions: Vec<CatalogEntry>,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1 // Current schema version
}

fn default_region() -> String {
    "tbofs".to_string()
}

fn default_animation_interval_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_forecast_opacity() -> f32 {
    0.8
}

fn default_chart_index_url() -> String {
    DEFAULT_CHART_INDEX_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            default_region: default_region(),
            basemap: Basemap::default(),
            animation_interval_ms: default_animation_interval_ms(),
            autoplay: false,
            show_enc: true,
            show_forecast: true,
            forecast_opacity: default_forecast_opacity(),
            chart_index_url: default_chart_index_url(),
            identify_out_fields: Vec::new(),
            discard_stale_identify: false,
            regions: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Region catalog: custom regions when configured, otherwise built-in
    pub fn catalog(&self) -> Result<RegionCatalog, CatalogError> {
        if self.regions.is_empty() {
            Ok(RegionCatalog::builtin())
        } else {
            RegionCatalog::from_entries(self.regions.clone())
        }
    }

    /// Controller settings derived from this configuration
    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            tick_interval: Duration::from_millis(self.animation_interval_ms.max(1)),
            identify: IdentifyConfig {
                discard_stale: self.discard_stale_identify,
                out_fields: self.identify_out_fields.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_region, "tbofs");
        assert_eq!(config.animation_interval_ms, 2000);
        assert_eq!(config.basemap, Basemap::Stamen);
        assert!(config.show_enc);
        assert!(!config.discard_stale_identify);
    }

    #[test]
    fn test_viewer_config() {
        let config = AppConfig {
            animation_interval_ms: 500,
            discard_stale_identify: true,
            ..Default::default()
        };
        let viewer = config.viewer_config();
        assert_eq!(viewer.tick_interval, Duration::from_millis(500));
        assert!(viewer.identify.discard_stale);
    }

    #[test]
    fn test_empty_regions_uses_builtin() {
        let catalog = AppConfig::default().catalog().unwrap();
        assert!(catalog.contains("cbofs"));
    }

    #[test]
    fn test_custom_regions_parse() {
        let json = r#"{
            "regions": [{
                "id": "leofs",
                "label": "Lake Erie",
                "center": {"lon": -81.2, "lat": 41.9},
                "zoom": 8.0,
                "start_time": "2020-01-01T00:00:00Z",
                "end_time": "2020-01-02T00:00:00Z",
                "step_minutes": 60
            }]
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.default_region().id, "leofs");
    }
}
