//! Map rendering: basemaps, remote overlays and the map widget.
//!
//! This module provides the background tile sources, WMS/ArcGIS overlays
//! drawn as tiles, and the view that the viewer core drives.

pub mod basemaps;
pub mod overlay;
pub mod view;

pub use basemaps::{Basemap, BasemapSource};
pub use overlay::OverlayLayer;
pub use view::{MapInteraction, MapView};
