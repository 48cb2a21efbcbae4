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

//! Region catalog.
//!
//! Each region pairs a map view (center and zoom) with the operational
//! forecast model whose surface-current frames are animated over it. The
//! catalog is built once at startup and never mutated.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projection::LonLat;
use crate::source::{RemoteSource, SourceProtocol};

/// WMS endpoint serving S-111 surface-current frames for every model.
pub const FORECAST_WMS_ENDPOINT: &str = "https://nimbostratus.ccom.nh/geoserver/s100ofs_Geo/wms";

/// Errors raised while building a catalog from configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog has no regions")]
    Empty,

    #[error("duplicate region id: {0}")]
    DuplicateRegion(String),

    #[error("region {0}: start time must be before end time")]
    EmptyRange(String),

    #[error("region {0}: time step must be positive")]
    NonPositiveStep(String),

    #[error("region {0}: time step is too large")]
    StepOutOfRange(String),
}

/// A named map region.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub label: String,
    pub center: LonLat,
    pub zoom: f64,
}

/// Forecast dataset animated over a region.
#[derive(Debug, Clone)]
pub struct ForecastModel {
    pub region_id: String,
    pub source: RemoteSource,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub step: Duration,
}

impl ForecastModel {
    /// Number of distinct frames visited before the animation wraps.
    #[must_use]
    pub fn frame_count(&self) -> u32 {
        let span = (self.end_time - self.start_time).num_milliseconds();
        let step = self.step.num_milliseconds();
        if step <= 0 || span < 0 {
            return 0;
        }
        // Ceiling division: an uneven last step still lands one frame past the end.
        let steps = span / step + i64::from(span % step != 0);
        u32::try_from(steps.saturating_add(1)).unwrap_or(u32::MAX)
    }
}

/// Configuration form of a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub label: String,
    pub center: LonLat,
    pub zoom: f64,
    /// WMS layer name; defaults to `s100ofs_Geo:<id>`.
    #[serde(default)]
    pub layer: Option<String>,
    /// WMS endpoint; defaults to [`FORECAST_WMS_ENDPOINT`].
    #[serde(default)]
    pub endpoint: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub step_minutes: i64,
}

impl CatalogEntry {
    fn into_pair(self, step: Duration) -> (Region, ForecastModel) {
        let layer = self
            .layer
            .unwrap_or_else(|| format!("s100ofs_Geo:{}", self.id));
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| FORECAST_WMS_ENDPOINT.to_owned());
        let source = RemoteSource::new(endpoint, SourceProtocol::Wms)
            .with_param("layers", layer)
            .with_param("format", "image/png8")
            .with_param("transparent", "true");

        let region = Region {
            id: self.id.clone(),
            label: self.label,
            center: self.center,
            zoom: self.zoom,
        };
        let model = ForecastModel {
            region_id: self.id,
            source,
            start_time: self.start_time,
            end_time: self.end_time,
            step,
        };
        (region, model)
    }
}

/// Immutable set of regions and their forecast models.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    entries: Vec<(Region, ForecastModel)>,
}

impl RegionCatalog {
    /// Build a catalog from configuration entries, validating each model.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut out: Vec<(Region, ForecastModel)> = Vec::with_capacity(entries.len());
        for entry in entries {
            if out.iter().any(|(r, _)| r.id == entry.id) {
                return Err(CatalogError::DuplicateRegion(entry.id));
            }
            if entry.start_time >= entry.end_time {
                return Err(CatalogError::EmptyRange(entry.id));
            }
            if entry.step_minutes <= 0 {
                return Err(CatalogError::NonPositiveStep(entry.id));
            }
            // Every advance adds the step to a time at or before `end_time`.
            let Some(step) = Duration::try_minutes(entry.step_minutes)
                .filter(|step| entry.end_time.checked_add_signed(*step).is_some())
            else {
                return Err(CatalogError::StepOutOfRange(entry.id));
            };
            out.push(entry.into_pair(step));
        }

        Ok(Self { entries: out })
    }

    /// The built-in NOS operational forecast system regions.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = builtin_entries();
        match Self::from_entries(entries) {
            Ok(catalog) => catalog,
            Err(e) => unreachable!("built-in catalog is invalid: {e}"),
        }
    }

    #[must_use]
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.entries.iter().map(|(region, _)| region)
    }

    #[must_use]
    pub fn region(&self, id: &str) -> Option<&Region> {
        self.entries
            .iter()
            .find(|(region, _)| region.id == id)
            .map(|(region, _)| region)
    }

    #[must_use]
    pub fn model(&self, id: &str) -> Option<&ForecastModel> {
        self.entries
            .iter()
            .find(|(region, _)| region.id == id)
            .map(|(_, model)| model)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.region(id).is_some()
    }

    /// First region in catalog order.
    #[must_use]
    pub fn default_region(&self) -> &Region {
        &self.entries[0].0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn builtin_entries() -> Vec<CatalogEntry> {
    let entry = |id: &str, label: &str, center: LonLat, zoom: f64, start, end, step_minutes| CatalogEntry {
        id: id.to_owned(),
        label: label.to_owned(),
        center,
        zoom,
        layer: None,
        endpoint: None,
        start_time: start,
        end_time: end,
        step_minutes,
    };

    vec![
        entry(
            "tbofs",
            "Tampa Bay",
            LonLat::new(-82.773, 27.557),
            10.0,
            utc(2018, 7, 11, 13),
            utc(2018, 7, 13, 12),
            60,
        ),
        entry(
            "cbofs",
            "Chesapeake Bay",
            LonLat::new(-76.16, 37.85),
            8.0,
            utc(2019, 12, 31, 19),
            utc(2020, 1, 2, 18),
            60,
        ),
        entry(
            "dbofs",
            "Delaware Bay",
            LonLat::new(-75.2, 39.2),
            9.0,
            utc(2019, 12, 31, 19),
            utc(2020, 1, 2, 18),
            60,
        ),
        entry(
            "nyofs",
            "Port of New York and New Jersey",
            LonLat::new(-74.05, 40.6),
            10.0,
            utc(2019, 12, 31, 19),
            utc(2020, 1, 2, 18),
            60,
        ),
        entry(
            "ngofs",
            "Northern Gulf of Mexico",
            LonLat::new(-90.0, 29.2),
            7.0,
            utc(2019, 12, 31, 21),
            utc(2020, 1, 2, 18),
            180,
        ),
        entry(
            "sfbofs",
            "San Francisco Bay",
            LonLat::new(-122.35, 37.75),
            10.0,
            utc(2019, 12, 31, 19),
            utc(2020, 1, 2, 18),
            120,
        ),
    ]
}
