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

//! HTTP client for the ENC/S-102/S-111 coverage feature service.

use std::time::Duration;

use log::{debug, warn};
use ofs_core::{ChartIndexQuery, ChartIndexService, FeatureSet, IdentifyError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Queries an ArcGIS `MapServer/<layer>/query` endpoint
#[derive(Debug, Clone)]
pub struct RestChartIndex {
    client: reqwest::Client,
    url: String,
}

impl RestChartIndex {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("s111-viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to configure HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            url: url.into(),
        }
    }

    fn request(&self, query: &ChartIndexQuery) -> reqwest::RequestBuilder {
        self.client.get(&self.url).query(&query.to_params())
    }
}

impl ChartIndexService for RestChartIndex {
    async fn query(&self, query: ChartIndexQuery) -> Result<FeatureSet, IdentifyError> {
        debug!(
            "Chart index query at ({:.1}, {:.1})",
            query.point.x, query.point.y
        );

        let response = self
            .request(&query)
            .send()
            .await
            .map_err(|e| IdentifyError::NetworkFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentifyError::NetworkFailure(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IdentifyError::NetworkFailure(e.to_string()))?;
        FeatureSet::from_json(&body)
    }
}
