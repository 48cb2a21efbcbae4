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

//! Chart-index point queries and their responses.
//!
//! Queries use the ArcGIS REST `query` form; responses are the usual
//! `{ "features": [ { "geometry": ..., "attributes": ... } ] }` feature set.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projection::Projected;

/// Errors raised while identifying a chart cell.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    #[error("no chart cell at this location")]
    QueryEmpty,

    #[error("chart index request failed: {0}")]
    NetworkFailure(String),

    #[error("malformed chart index response: {0}")]
    Malformed(String),
}

/// Spatial relationship between the query geometry and indexed features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialRelation {
    #[default]
    Intersects,
}

impl SpatialRelation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SpatialRelation::Intersects => "esriSpatialRelIntersects",
        }
    }
}

/// Point-intersection query against the chart index.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartIndexQuery {
    /// Query point in EPSG:3857.
    pub point: Projected,
    pub spatial_rel: SpatialRelation,
    pub out_fields: Vec<String>,
    pub return_geometry: bool,
}

impl ChartIndexQuery {
    /// Query returning every field and the feature geometry.
    #[must_use]
    pub fn at(point: Projected) -> Self {
        Self {
            point,
            spatial_rel: SpatialRelation::Intersects,
            out_fields: vec!["*".to_owned()],
            return_geometry: true,
        }
    }

    #[must_use]
    pub fn with_out_fields(mut self, fields: Vec<String>) -> Self {
        if !fields.is_empty() {
            self.out_fields = fields;
        }
        self
    }

    /// Form parameters for the REST `query` endpoint.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let geometry = serde_json::json!({
            "x": self.point.x,
            "y": self.point.y,
            "spatialReference": { "wkid": 3857 },
        });
        vec![
            ("geometry", geometry.to_string()),
            ("geometryType", "esriGeometryPoint".to_owned()),
            ("inSR", "3857".to_owned()),
            ("outSR", "3857".to_owned()),
            ("spatialRel", self.spatial_rel.as_str().to_owned()),
            ("outFields", self.out_fields.join(",")),
            ("returnGeometry", self.return_geometry.to_string()),
            ("f", "json".to_owned()),
        ]
    }
}

/// Scalar attribute value as returned by the chart index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Integer(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x}"),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

/// Attribute mapping of a single feature.
pub type Attributes = BTreeMap<String, AttributeValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: serde_json::Value,
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ServiceError,
}

impl FeatureSet {
    /// Parse a REST response body, turning an `{ "error": ... }` payload into
    /// [`IdentifyError::NetworkFailure`].
    pub fn from_json(body: &str) -> Result<Self, IdentifyError> {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            let code = envelope
                .error
                .code
                .map_or_else(String::new, |c| format!("{c}: "));
            return Err(IdentifyError::NetworkFailure(format!(
                "{code}{}",
                envelope.error.message
            )));
        }
        serde_json::from_str(body).map_err(|e| IdentifyError::Malformed(e.to_string()))
    }
}

/// Remote chart-index service answering point queries.
pub trait ChartIndexService: Send + Sync + 'static {
    fn query(
        &self,
        query: ChartIndexQuery,
    ) -> impl Future<Output = Result<FeatureSet, IdentifyError>> + Send;
}
