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

//! Parameterized remote image sources.
//!
//! A [`RemoteSource`] describes a WMS or ArcGIS `export` endpoint together with
//! a mutable parameter set. The forecast layer keys its imagery on the `time`
//! parameter; every parameter update is expected to trigger a re-fetch on the
//! rendering side.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

use crate::projection::Extent;

/// Parameter key holding the valid time of the requested frame.
pub const TIME_PARAM: &str = "time";

/// Ordered request parameters for a remote source.
pub type SourceParams = BTreeMap<String, String>;

/// Remote image protocol spoken by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceProtocol {
    /// OGC WMS 1.3.0 `GetMap`.
    Wms,
    /// ArcGIS REST `MapServer/export`.
    ArcGisExport,
}

/// Hook applied to every request URL a source produces.
///
/// Some servers are picky about parameter casing; the hook lets a source
/// rewrite the final URL without touching how it is built.
#[derive(Clone)]
pub struct RequestTransform(Arc<dyn Fn(String) -> String + Send + Sync>);

impl RequestTransform {
    pub fn new(f: impl Fn(String) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn apply(&self, url: String) -> String {
        (self.0)(url)
    }
}

impl fmt::Debug for RequestTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestTransform(..)")
    }
}

/// Lowercases the ArcGIS export keys that the Maritime Chart Server only
/// accepts in lower case.
#[must_use]
pub fn lowercase_arcgis_keys() -> RequestTransform {
    const KEYS: [(&str, &str); 8] = [
        ("BBOX=", "bbox="),
        ("BBOXSR=", "bboxsr="),
        ("F=", "f="),
        ("FORMAT=", "format="),
        ("TRANSPARENT=", "transparent="),
        ("SIZE=", "size="),
        ("IMAGESR=", "imagesr="),
        ("DPI=", "dpi="),
    ];
    RequestTransform::new(|url| {
        let Some((base, query)) = url.split_once('?') else {
            return url;
        };
        let query = query
            .split('&')
            .map(|pair| {
                KEYS.iter()
                    .find_map(|(upper, lower)| {
                        pair.strip_prefix(upper).map(|rest| format!("{lower}{rest}"))
                    })
                    .unwrap_or_else(|| pair.to_owned())
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{base}?{query}")
    })
}

/// A remote, parameterized image endpoint.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    endpoint: String,
    protocol: SourceProtocol,
    params: SourceParams,
    transform: Option<RequestTransform>,
}

impl RemoteSource {
    pub fn new(endpoint: impl Into<String>, protocol: SourceProtocol) -> Self {
        Self {
            endpoint: endpoint.into(),
            protocol,
            params: SourceParams::new(),
            transform: None,
        }
    }

    /// Builder-style parameter insertion.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: RequestTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn protocol(&self) -> SourceProtocol {
        self.protocol
    }

    #[must_use]
    pub fn params(&self) -> &SourceParams {
        &self.params
    }

    /// Merge `params` into the current parameter set.
    pub fn update_params(&mut self, params: SourceParams) {
        self.params.extend(params);
    }

    /// Current `time` parameter, if any.
    #[must_use]
    pub fn time(&self) -> Option<&str> {
        self.params.get(TIME_PARAM).map(String::as_str)
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.params.insert(TIME_PARAM.to_owned(), format_time_param(time));
    }

    /// Build the request URL for an image covering `extent` at `width`x`height` pixels.
    #[must_use]
    pub fn request_url(&self, extent: Extent, width: u32, height: u32) -> String {
        let mut pairs: Vec<(String, String)> = match self.protocol {
            SourceProtocol::Wms => vec![
                ("SERVICE".into(), "WMS".into()),
                ("VERSION".into(), "1.3.0".into()),
                ("REQUEST".into(), "GetMap".into()),
                ("CRS".into(), "EPSG:3857".into()),
                ("STYLES".into(), String::new()),
                ("WIDTH".into(), width.to_string()),
                ("HEIGHT".into(), height.to_string()),
                ("BBOX".into(), extent.to_bbox_string()),
            ],
            SourceProtocol::ArcGisExport => vec![
                ("BBOX".into(), extent.to_bbox_string()),
                ("BBOXSR".into(), "3857".into()),
                ("F".into(), "image".into()),
                ("FORMAT".into(), "png32".into()),
                ("TRANSPARENT".into(), "true".into()),
                ("SIZE".into(), format!("{width},{height}")),
                ("IMAGESR".into(), "3857".into()),
                ("DPI".into(), "90".into()),
            ],
        };

        for (key, value) in &self.params {
            let key = key.to_uppercase();
            // Explicit params win over the defaults above.
            if let Some(existing) = pairs.iter_mut().find(|(k, _)| *k == key) {
                existing.1.clone_from(value);
            } else {
                pairs.push((key, value.clone()));
            }
        }

        let base = match self.protocol {
            SourceProtocol::Wms => self.endpoint.clone(),
            SourceProtocol::ArcGisExport => format!("{}/export", self.endpoint.trim_end_matches('/')),
        };

        let url = match Url::parse_with_params(&base, &pairs) {
            Ok(url) => url.to_string(),
            Err(e) => {
                log::warn!("Invalid source endpoint {}: {}", base, e);
                base
            }
        };

        match &self.transform {
            Some(transform) => transform.apply(url),
            None => url,
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
#[must_use]
pub fn format_time_param(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Maritime Chart Server endpoint for the ENC overlay.
pub const ENC_ENDPOINT: &str = "https://gis.charttools.noaa.gov/arcgis/rest/services/MCS/ENCOnline/MapServer/exts/Maritime%20Chart%20Server/MapServer";

const ENC_DISPLAY_PARAMS: &str = r#"{"ECDISParameters":{"version":"1.0","StaticParameters":{"Parameter":[{"name":"AreaSymbolizationType","value":2},{"name":"PointSymbolizationType","value":2}]},"DynamicParameters":{"Parameter":[{"name":"ColorScheme","value":3},{"name":"DisplayDepthUnits","value":1},{"name":"TwoDepthShades","value":1},{"name":"DisplayNOBJNM","value":1},{"name":"HonorScamin","value":2},{"name":"ShallowDepthPattern","value":1},{"name":"ShallowContour","value":2},{"name":"SafetyContour","value":10},{"name":"DeepContour","value":30},{"name":"DisplayCategory","value":"1,2,4"}]}}}"#;

/// Electronic navigational chart overlay rendered by the Maritime Chart Server.
#[must_use]
pub fn enc_source() -> RemoteSource {
    RemoteSource::new(ENC_ENDPOINT, SourceProtocol::ArcGisExport)
        .with_param("layers", "show:0,2,3,4,5,6,7")
        .with_param("format", "png8")
        .with_param("bboxsr", r#"{"wkid":3857}"#)
        .with_param("display_params", ENC_DISPLAY_PARAMS)
        .with_transform(lowercase_arcgis_keys())
}
