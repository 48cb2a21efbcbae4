//! Network services used by the viewer.
//!
//! This module holds the HTTP client for the chart index feature service.

pub mod chart_index;

pub use chart_index::RestChartIndex;
