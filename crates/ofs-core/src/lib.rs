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

//! Forecast animation and chart identify core for the S-111 chart viewer.
//!
//! This crate holds the stateful parts of the viewer, independent of any GUI
//! toolkit:
//!
//! - **Catalog**: regions and the operational forecast models animated over them
//! - **Time series**: the active model's valid time, advanced and wrapped per tick
//! - **Scheduler**: a single cancellable play/pause timer
//! - **Binding**: the one forecast layer, rebound on region switches
//! - **Identify**: chart-index point queries, highlight and tabbed popup state
//!
//! The GUI talks to it through [`MapSurface`] and [`Command`]s:
//!
//! ```no_run
//! use std::sync::Arc;
//! use ofs_core::{Command, RegionCatalog, Viewer, ViewerConfig};
//! # use ofs_core::{ChartIndexQuery, ChartIndexService, FeatureSet, IdentifyError};
//! # struct Offline;
//! # impl ChartIndexService for Offline {
//! #     fn query(&self, _: ChartIndexQuery)
//! #         -> impl std::future::Future<Output = Result<FeatureSet, IdentifyError>> + Send {
//! #         async { Ok(FeatureSet::default()) }
//! #     }
//! # }
//! # async fn example(surface: &mut dyn ofs_core::MapSurface) {
//! let catalog = Arc::new(RegionCatalog::builtin());
//! let mut viewer = Viewer::new(catalog, Arc::new(Offline), ViewerConfig::default());
//!
//! viewer.dispatch(Command::SelectRegion("cbofs".into()), surface);
//! viewer.dispatch(Command::TogglePlay, surface);
//! while viewer.next(surface).await {
//!     println!("{}", viewer.series().display_label());
//! }
//! # }
//! ```

pub mod binding;
pub mod catalog;
pub mod identify;
pub mod projection;
pub mod scheduler;
pub mod source;
pub mod surface;
pub mod timeseries;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use binding::{BindError, LayerBinding};
pub use catalog::{CatalogEntry, CatalogError, ForecastModel, Region, RegionCatalog};
pub use identify::{
    AttributeTable, AttributeValue, ChartIndexQuery, ChartIndexService, FeatureSet, Geometry,
    HighlightFeature, IdentifyConfig, IdentifyController, IdentifyError, IdentifyResult,
    IdentifyState, Popup, ProductTab,
};
pub use projection::{Extent, LonLat, Projected, WebMercator};
pub use scheduler::{AnimationScheduler, WakeFn, DEFAULT_TICK_INTERVAL};
pub use source::{enc_source, RemoteSource, RequestTransform, SourceParams, SourceProtocol};
pub use surface::{LayerId, MapSurface};
pub use timeseries::{AnimationState, TimeSeriesController, TimeSeriesError};
pub use viewer::{Command, Viewer, ViewerConfig};
